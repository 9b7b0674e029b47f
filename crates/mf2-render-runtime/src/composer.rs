use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mf2_render_core::{
    Args, BasicFormatBackend, FormatBackend, FormatOptions, FunctionRegistry, MessageFormat,
    MessagePart,
};
use tracing::{debug, warn};

use crate::bundle::Bundle;
use crate::error::{RuntimeError, RuntimeResult};

pub struct ComposerOptions {
    pub locale: String,
    pub bundles: Vec<Bundle>,
    /// Custom functions, merged over the built-in ones.
    pub functions: FunctionRegistry,
    pub backend: Rc<dyn FormatBackend>,
    pub bidi_isolation: bool,
}

impl ComposerOptions {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            bundles: Vec::new(),
            functions: FunctionRegistry::new(),
            backend: Rc::new(BasicFormatBackend),
            bidi_isolation: true,
        }
    }

    pub fn with_bundle(mut self, bundle: Bundle) -> Self {
        self.bundles.push(bundle);
        self
    }

    pub fn with_bundles(mut self, bundles: impl IntoIterator<Item = Bundle>) -> Self {
        self.bundles.extend(bundles);
        self
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions.extend(&functions);
        self
    }

    pub fn with_backend(mut self, backend: Rc<dyn FormatBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_bidi_isolation(mut self, enabled: bool) -> Self {
        self.bidi_isolation = enabled;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageResolution {
    pub locale: String,
    pub message: String,
}

/// Resolves message keys against the active locale's bundle and caches the
/// compiled formatter for every `(locale, key)` pair it has seen.
pub struct Composer {
    locale: RefCell<String>,
    bundles: BTreeMap<String, Bundle>,
    functions: FunctionRegistry,
    backend: Rc<dyn FormatBackend>,
    format_options: FormatOptions,
    cache: RefCell<BTreeMap<(String, String), Rc<MessageFormat>>>,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("locale", &self.locale)
            .field("bundles", &self.bundles.keys().collect::<Vec<_>>())
            .field("functions", &self.functions)
            .field("cached_formatters", &self.cached_formatters())
            .finish()
    }
}

impl Composer {
    pub fn new(options: ComposerOptions) -> RuntimeResult<Self> {
        let mut bundles = BTreeMap::new();
        for bundle in options.bundles {
            let locale = bundle.locale().to_string();
            if bundles.contains_key(&locale) {
                return Err(RuntimeError::DuplicateLocale(locale));
            }
            bundles.insert(locale, bundle);
        }

        let mut functions = FunctionRegistry::with_defaults();
        functions.extend(&options.functions);

        debug!(
            "composer ready with {} bundle(s), active locale {}",
            bundles.len(),
            options.locale
        );
        Ok(Self {
            locale: RefCell::new(options.locale),
            bundles,
            functions,
            backend: options.backend,
            format_options: FormatOptions {
                bidi_isolation: options.bidi_isolation,
            },
            cache: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn locale(&self) -> String {
        self.locale.borrow().clone()
    }

    /// Switches the active locale. Unknown locales are accepted; lookups
    /// against them resolve nothing.
    pub fn set_locale(&self, locale: impl Into<String>) {
        let locale = locale.into();
        debug!("switching locale to {locale}");
        *self.locale.borrow_mut() = locale;
    }

    pub fn available_locales(&self) -> Vec<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn cached_formatters(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn resolve_message(&self, key: &str) -> Option<MessageResolution> {
        let locale = self.locale();
        let message = self.bundles.get(&locale)?.get_message(key)?.to_string();
        Some(MessageResolution { locale, message })
    }

    /// Returns the cached formatter for `(locale, key)`, compiling `pattern`
    /// on a miss. Patterns that fail to compile are never cached.
    pub fn formatter(&self, locale: &str, key: &str, pattern: &str) -> Option<Rc<MessageFormat>> {
        let cache_key = (locale.to_string(), key.to_string());
        if let Some(formatter) = self.cache.borrow().get(&cache_key) {
            return Some(Rc::clone(formatter));
        }

        let compiled = MessageFormat::compile(
            locale,
            pattern,
            self.functions.clone(),
            Rc::clone(&self.backend),
            self.format_options,
        );
        match compiled {
            Ok(formatter) => {
                debug!("compiled formatter for {key} in {locale}");
                let formatter = Rc::new(formatter);
                self.cache
                    .borrow_mut()
                    .insert(cache_key, Rc::clone(&formatter));
                Some(formatter)
            }
            Err(err) => {
                warn!("failed to compile message {key} in {locale}: {err}");
                None
            }
        }
    }

    /// Formats `key` to a string, degrading to the raw pattern or the key itself.
    pub fn t(&self, key: &str, args: &Args) -> String {
        let Some(resolution) = self.resolve_message(key) else {
            debug!("missing message {key} for locale {}", self.locale());
            return key.to_string();
        };
        let Some(formatter) = self.formatter(&resolution.locale, key, &resolution.message) else {
            return resolution.message;
        };
        match formatter.format(args) {
            Ok(output) => output,
            Err(err) => {
                warn!("failed to format message {key} in {}: {err}", resolution.locale);
                resolution.message
            }
        }
    }

    /// Formats `key` to parts; any failure yields no parts.
    pub fn tp(&self, key: &str, args: &Args) -> Vec<MessagePart> {
        let Some(resolution) = self.resolve_message(key) else {
            debug!("missing message {key} for locale {}", self.locale());
            return Vec::new();
        };
        let Some(formatter) = self.formatter(&resolution.locale, key, &resolution.message) else {
            return Vec::new();
        };
        match formatter.format_to_parts(args) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("failed to format parts for {key} in {}: {err}", resolution.locale);
                Vec::new()
            }
        }
    }

    pub fn te(&self, key: &str) -> bool {
        self.resolve_message(key).is_some()
    }
}

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mf2_render_core::{Args, FormatBackend, FunctionRegistry, MessagePart};
use mf2_render_runtime::{Bundle, Composer, ComposerOptions};
use tracing::debug;

use crate::error::ViewError;
use crate::markups::MarkupRegistry;

thread_local! {
    static INSTALLED: RefCell<Option<Mf2>> = const { RefCell::new(None) };
}

pub struct Mf2Options {
    pub composer: ComposerOptions,
    /// Custom markup renderers, merged over the built-in ones.
    pub markups: MarkupRegistry,
}

impl Mf2Options {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            composer: ComposerOptions::new(locale),
            markups: MarkupRegistry::new(),
        }
    }

    pub fn from_composer(composer: ComposerOptions) -> Self {
        Self {
            composer,
            markups: MarkupRegistry::new(),
        }
    }

    pub fn with_bundle(mut self, bundle: Bundle) -> Self {
        self.composer = self.composer.with_bundle(bundle);
        self
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.composer = self.composer.with_functions(functions);
        self
    }

    pub fn with_backend(mut self, backend: Rc<dyn FormatBackend>) -> Self {
        self.composer = self.composer.with_backend(backend);
        self
    }

    pub fn with_bidi_isolation(mut self, enabled: bool) -> Self {
        self.composer = self.composer.with_bidi_isolation(enabled);
        self
    }

    pub fn with_markups(mut self, markups: MarkupRegistry) -> Self {
        self.markups = self.markups.extend(&markups);
        self
    }
}

/// A composer plus the markup renderers used by message components.
#[derive(Clone)]
pub struct Mf2 {
    global: Rc<Composer>,
    markups: Rc<MarkupRegistry>,
}

impl fmt::Debug for Mf2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mf2")
            .field("global", &self.global)
            .field("markups", &self.markups)
            .finish()
    }
}

impl Mf2 {
    pub fn new(options: Mf2Options) -> Result<Self, ViewError> {
        let global = Composer::new(options.composer)?;
        let markups = MarkupRegistry::with_builtins().extend(&options.markups);
        Ok(Self {
            global: Rc::new(global),
            markups: Rc::new(markups),
        })
    }

    pub fn global(&self) -> &Rc<Composer> {
        &self.global
    }

    pub fn markups(&self) -> &MarkupRegistry {
        &self.markups
    }

    /// Makes this instance the one `use_mf2(None)` returns on this thread.
    pub fn install(&self) {
        debug!("installing mf2 instance for locale {}", self.global.locale());
        INSTALLED.with(|slot| *slot.borrow_mut() = Some(self.clone()));
    }

    pub fn installed() -> Option<Mf2> {
        INSTALLED.with(|slot| slot.borrow().clone())
    }

    pub fn uninstall() -> Option<Mf2> {
        INSTALLED.with(|slot| slot.borrow_mut().take())
    }
}

/// Resolves the explicit instance first, then the installed one.
pub fn use_mf2(explicit: Option<&Mf2>) -> Result<UseMf2, ViewError> {
    let mf2 = match explicit {
        Some(mf2) => mf2.clone(),
        None => Mf2::installed().ok_or(ViewError::NoInstance)?,
    };
    Ok(UseMf2 { mf2 })
}

#[derive(Debug, Clone)]
pub struct UseMf2 {
    mf2: Mf2,
}

impl UseMf2 {
    pub fn mf2(&self) -> &Mf2 {
        &self.mf2
    }

    pub fn t(&self, key: &str, args: &Args) -> String {
        self.mf2.global.t(key, args)
    }

    pub fn tp(&self, key: &str, args: &Args) -> Vec<MessagePart> {
        self.mf2.global.tp(key, args)
    }

    pub fn te(&self, key: &str) -> bool {
        self.mf2.global.te(key)
    }

    pub fn locale(&self) -> String {
        self.mf2.global.locale()
    }

    pub fn set_locale(&self, locale: impl Into<String>) {
        self.mf2.global.set_locale(locale);
    }

    pub fn available_locales(&self) -> Vec<String> {
        self.mf2.global.available_locales()
    }
}

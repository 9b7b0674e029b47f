use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use mf2_render_core::{Options, Value};

use crate::error::RenderResult;
use crate::ui::UiNode;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupRenderInput {
    pub children: Vec<UiNode>,
    pub options: Options,
}

pub type MarkupRenderer = Rc<dyn Fn(MarkupRenderInput) -> RenderResult<UiNode>>;

/// Maps markup names to renderers.
#[derive(Clone, Default)]
pub struct MarkupRegistry {
    renderers: BTreeMap<String, MarkupRenderer>,
}

impl MarkupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `bold`, `italic`, `underline`, `code`, `mark`/`highlight` and `link`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("bold", |input| Ok(wrap("strong", input)));
        registry.insert("italic", |input| Ok(wrap("em", input)));
        registry.insert("underline", |input| Ok(wrap("u", input)));
        registry.insert("code", |input| Ok(wrap("code", input)));
        registry.insert("mark", |input| Ok(wrap("mark", input)));
        registry.insert("highlight", |input| Ok(wrap("mark", input)));
        registry.insert("link", |input| {
            let href = normalize_href(input.options.get("to"));
            Ok(UiNode::element("a", input.children).with_attr("href", href))
        });
        registry
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, renderer: F)
    where
        F: Fn(MarkupRenderInput) -> RenderResult<UiNode> + 'static,
    {
        self.renderers.insert(name.into(), Rc::new(renderer));
    }

    pub fn with<F>(mut self, name: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(MarkupRenderInput) -> RenderResult<UiNode> + 'static,
    {
        self.insert(name, renderer);
        self
    }

    /// Adds every renderer of `other`, replacing same-named entries.
    pub fn extend(mut self, other: &MarkupRegistry) -> Self {
        for (name, renderer) in &other.renderers {
            self.renderers.insert(name.clone(), Rc::clone(renderer));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&MarkupRenderer> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }
}

impl fmt::Debug for MarkupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.renderers.keys()).finish()
    }
}

fn wrap(tag: &str, input: MarkupRenderInput) -> UiNode {
    UiNode::element(tag, input.children)
}

/// Turns a link's `to` option into an href. Missing, non-string and blank
/// values become `#`; one layer of matching quotes is stripped.
pub fn normalize_href(to: Option<&Value>) -> String {
    let Some(Value::Str(raw)) = to else {
        return "#".to_string();
    };
    let mut href = raw.trim();
    for quote in ['"', '\''] {
        if href.starts_with(quote) && href.ends_with(quote) {
            href = href.get(1..href.len() - 1).unwrap_or_default().trim();
            break;
        }
    }
    if href.is_empty() {
        "#".to_string()
    } else {
        href.to_string()
    }
}

use mf2_render_core::{Args, Value};
use tracing::warn;

use crate::ast::build_tree;
use crate::error::{RenderResult, ViewError};
use crate::plugin::{Mf2, use_mf2};
use crate::render::render_nodes;
use crate::slots::{SlotProps, Slots};
use crate::ui::UiNode;

pub const DEFAULT_TAG: &str = "span";

/// Renders one message into a wrapper element, resolving markup and slots.
/// Any failure along the way degrades to the plain formatted string.
#[derive(Debug, Clone)]
pub struct Mf2Message {
    pub keypath: Option<String>,
    /// Alias of `keypath`, consulted only when `keypath` is unset.
    pub path: Option<String>,
    pub args: Args,
    pub tag: String,
    pub slots: Slots,
}

impl Default for Mf2Message {
    fn default() -> Self {
        Self {
            keypath: None,
            path: None,
            args: Args::new(),
            tag: DEFAULT_TAG.to_string(),
            slots: Slots::new(),
        }
    }
}

impl Mf2Message {
    pub fn new(keypath: impl Into<String>) -> Self {
        Self {
            keypath: Some(keypath.into()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name, value);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_slot<F>(mut self, name: impl Into<String>, slot: F) -> Self
    where
        F: Fn(&SlotProps) -> RenderResult<UiNode> + 'static,
    {
        self.slots.insert(name, slot);
        self
    }

    pub fn render(&self, mf2: &Mf2) -> UiNode {
        let Some(keypath) = self.keypath.as_deref().or(self.path.as_deref()) else {
            return self.wrap(Vec::new());
        };
        let composer = mf2.global();
        let parts = composer.tp(keypath, &self.args);
        if parts.is_empty() {
            return self.plain(mf2, keypath);
        }

        let tree = build_tree(&parts);
        match render_nodes(&tree, &self.slots, mf2.markups()) {
            Ok(children) if children.is_empty() => self.plain(mf2, keypath),
            Ok(children) => self.wrap(children),
            Err(err) => {
                warn!("rendering {keypath} failed, using plain text: {err}");
                self.plain(mf2, keypath)
            }
        }
    }

    /// Renders against the instance installed on this thread.
    pub fn render_installed(&self) -> Result<UiNode, ViewError> {
        let context = use_mf2(None)?;
        Ok(self.render(context.mf2()))
    }

    pub fn render_html(&self, mf2: &Mf2) -> String {
        self.render(mf2).to_html()
    }

    fn plain(&self, mf2: &Mf2, keypath: &str) -> UiNode {
        self.wrap(vec![UiNode::text(mf2.global().t(keypath, &self.args))])
    }

    fn wrap(&self, children: Vec<UiNode>) -> UiNode {
        UiNode::element(self.tag.as_str(), children)
    }
}

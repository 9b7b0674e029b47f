#![forbid(unsafe_code)]

mod ast;
mod error;
mod markups;
mod message;
mod plugin;
mod render;
mod slots;
mod ui;

pub use crate::ast::{AstNode, build_tree, expression_text, flatten, variable_name};
pub use crate::error::{RenderError, RenderResult, ViewError};
pub use crate::markups::{MarkupRegistry, MarkupRenderInput, MarkupRenderer, normalize_href};
pub use crate::message::{DEFAULT_TAG, Mf2Message};
pub use crate::plugin::{Mf2, Mf2Options, UseMf2, use_mf2};
pub use crate::render::{DEFAULT_CONTAINER, render_nodes};
pub use crate::slots::{SlotFn, SlotProps, Slots};
pub use crate::ui::UiNode;

pub use mf2_render_core::{Args, MessagePart, Options, Value};
pub use mf2_render_runtime::{Bundle, Composer, ComposerOptions, RuntimeError};

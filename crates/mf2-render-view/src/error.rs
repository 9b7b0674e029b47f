use mf2_render_runtime::RuntimeError;
use thiserror::Error;

/// Failure raised by a slot or markup renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("slot '{name}' failed: {message}")]
    Slot { name: String, message: String },
    #[error("markup renderer '{name}' failed: {message}")]
    Markup { name: String, message: String },
}

impl RenderError {
    pub fn slot(name: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Slot {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn markup(name: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Markup {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("no mf2 instance was passed explicitly or installed on this thread")]
    NoInstance,
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

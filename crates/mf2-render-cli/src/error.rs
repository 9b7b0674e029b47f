use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("runtime error: {0}")]
    Runtime(#[from] mf2_render_runtime::RuntimeError),
    #[error("view error: {0}")]
    View(#[from] mf2_render_view::ViewError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

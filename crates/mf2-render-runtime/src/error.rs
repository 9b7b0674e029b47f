use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("duplicate bundle locale '{0}' is not allowed; pass one bundle per locale")]
    DuplicateLocale(String),
    #[error("bundle for locale '{0}' must be a JSON object of message patterns")]
    InvalidBundle(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

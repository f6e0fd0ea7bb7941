use thiserror::Error;

#[derive(Error, Debug)]
pub enum GhMirrorError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mirror URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, GhMirrorError>;

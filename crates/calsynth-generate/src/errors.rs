use thiserror::Error;

/// Errors emitted by the transformers.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid recurrence rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
    #[error("invalid seed catalog: {0}")]
    InvalidCatalog(String),
    #[error("invalid datetime '{value}' in {field}")]
    InvalidDatetime { field: String, value: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

use thiserror::Error;

/// Errors emitted by the core contracts.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown rsvp status: {0}")]
    UnknownStatus(String),
    #[error("unknown sql dialect: {0}")]
    UnknownDialect(String),
    #[error("dataset validation failed with {0} issue(s)")]
    Validation(usize),
}

pub type Result<T> = std::result::Result<T, CoreError>;

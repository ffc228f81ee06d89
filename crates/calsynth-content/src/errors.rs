use thiserror::Error;

/// Errors emitted by the content providers.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("missing environment variable {0}")]
    MissingEnv(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("model '{0}' returned an empty completion")]
    EmptyCompletion(String),
    #[error("response failed schema validation: {0}")]
    Schema(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("giving up after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

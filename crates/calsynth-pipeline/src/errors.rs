use thiserror::Error;

use crate::step::Step;

/// Errors emitted by the pipeline driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("core error: {0}")]
    Core(#[from] calsynth_core::CoreError),
    #[error("generation error: {0}")]
    Generate(#[from] calsynth_generate::GenerateError),
    #[error("content error: {0}")]
    Content(#[from] calsynth_content::ContentError),
    #[error("emit error: {0}")]
    Emit(#[from] calsynth_emit::EmitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(
        "step '{step}' has no checkpoint; run it first or drop it from --skip"
    )]
    MissingCheckpoint { step: Step },
}

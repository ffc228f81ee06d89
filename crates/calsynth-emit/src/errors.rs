use thiserror::Error;

use calsynth_core::{RsvpStatus, SqlDialect};

/// Errors emitted by the output layer.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("status '{status}' is not representable in the {dialect} schema")]
    UnsupportedStatus {
        status: RsvpStatus,
        dialect: SqlDialect,
    },
}

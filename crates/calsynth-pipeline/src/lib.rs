//! Pipeline driver for calsynth.
//!
//! Sequences the seven generation steps, persists per-step checkpoints
//! with a hashed manifest, and executes the emitted SQLite script.

pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod errors;
pub mod execute;
pub mod step;

pub use checkpoint::{CheckpointStore, Manifest, ManifestEntry};
pub use config::{ContentConfig, GenerateSettings, PipelineConfig};
pub use driver::{Pipeline, RunSummary};
pub use errors::PipelineError;
pub use execute::{ExecutionSummary, execute_sqlite};
pub use step::Step;

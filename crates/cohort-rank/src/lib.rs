//! Merging, rebasing and ranking of student score sheets with no fixed schema.

pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod telemetry;

pub use config::{AppConfig, PipelineSettings};
pub use error::AppError;
pub use pipeline::{run_pipeline, Pipeline, PipelineError, PipelineOutput, Record};

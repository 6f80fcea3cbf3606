use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the source CSV files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single pipeline could not produce its view. Contained by the
/// orchestrator, which substitutes a placeholder result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("column `{0}` is not present in the input data")]
    MissingColumn(&'static str),

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

/// Failures while exporting a bundle.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

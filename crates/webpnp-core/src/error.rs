use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebPnpError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),

    #[error("Workload {workload} must run at least once")]
    ZeroRunTimes { workload: String },

    #[error("Score field '{field}' is missing")]
    MissingScore { field: String },

    #[error("Score field '{field}' is not numeric: {value}")]
    NonNumericScore { field: String, value: String },

    #[error("Cannot select a median from an empty batch")]
    EmptyBatch,

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WebPnpError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WebPnpError>;

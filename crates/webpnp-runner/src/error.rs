use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use webpnp_core::WebPnpError;

use crate::executor::ExecutorError;

/// Where in a workload run an executor call happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Warmup,
    /// Zero-based round index
    Round(u32),
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Warmup => f.write_str("warm-up"),
            RunPhase::Round(i) => write!(f, "round {}", i + 1),
        }
    }
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Core(#[from] WebPnpError),

    #[error("Workload {workload} failed in {phase}: {source}")]
    Execution {
        workload: String,
        phase: RunPhase,
        #[source]
        source: ExecutorError,
    },

    #[error("Failed to store {workload} result at {}: {source}", .path.display())]
    Store {
        workload: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote sync of {workload} failed to {action}: {source}")]
    Sync {
        workload: String,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("No result server configured")]
    NoResultServer,

    #[error("Device info unavailable: {0}")]
    DeviceInfo(String),

    #[error("Expected exactly one {workload} result matching the search, found {found}")]
    AmbiguousSearch { workload: String, found: usize },

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RunnerError {
    pub(crate) fn store(workload: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Store {
            workload: workload.to_string(),
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sync(workload: &str, action: &'static str, source: std::io::Error) -> Self {
        Self::Sync {
            workload: workload.to_string(),
            action,
            source,
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::Core(WebPnpError::Json(err))
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;

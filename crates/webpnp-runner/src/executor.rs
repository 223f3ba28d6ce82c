use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use webpnp_core::{ScoreRecord, WebPnpConfig, WebPnpError, WorkloadSpec};

use crate::command::CommandExecutor;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Driver failed: {0}")]
    Failed(String),
    #[error("Driver timed out after {0}s")]
    Timeout(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid score output: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

/// Runs one round of a benchmark suite and reports its scores
#[async_trait]
pub trait WorkloadExecutor: Send + Sync {
    async fn execute(
        &self,
        workload: &WorkloadSpec,
        browser_flags: &[String],
    ) -> Result<ScoreRecord, ExecutorError>;
}

/// Workload name to executor table
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn WorkloadExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Registers a [`CommandExecutor`] for every entry of `config.executors`
    pub fn from_config(config: &WebPnpConfig) -> Self {
        let mut registry = Self::new();
        for (name, command) in &config.executors {
            registry.register(name.clone(), Arc::new(CommandExecutor::new(command)));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn WorkloadExecutor>) {
        self.executors.insert(name.into(), executor);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn WorkloadExecutor>, WebPnpError> {
        self.executors
            .get(name)
            .cloned()
            .ok_or_else(|| WebPnpError::UnknownWorkload(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.executors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Result, WebPnpError, WorkloadSpec};

/// Env var that overrides `result_server.password`
pub const SERVER_PASSWORD_ENV: &str = "WEBPNP_SERVER_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPnpConfig {
    #[serde(default)]
    pub workloads: Vec<WorkloadSpec>,
    #[serde(default)]
    pub chrome_flags: Vec<String>,
    #[serde(default = "default_results_root")]
    pub results_root: PathBuf,
    #[serde(default)]
    pub result_server: Option<ResultServerConfig>,
    /// Skip remote sync around each workload
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
    #[serde(default)]
    pub executors: BTreeMap<String, ExecutorCommandConfig>,
}

impl Default for WebPnpConfig {
    fn default() -> Self {
        Self {
            workloads: Vec::new(),
            chrome_flags: Vec::new(),
            results_root: default_results_root(),
            result_server: None,
            dev_mode: default_dev_mode(),
            executors: BTreeMap::new(),
        }
    }
}

fn default_results_root() -> PathBuf {
    PathBuf::from("results")
}

fn default_dev_mode() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultServerConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Defaults to `/home/<username>/webpnp/results`
    #[serde(default)]
    pub archive_root: Option<String>,
}

fn default_ssh_port() -> u16 {
    22
}

impl ResultServerConfig {
    pub fn archive_root(&self) -> String {
        self.archive_root
            .clone()
            .unwrap_or_else(|| format!("/home/{}/webpnp/results", self.username))
    }
}

/// External driver process for one workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorCommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    600
}

impl WebPnpConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| WebPnpError::io(path, e))?;
        let mut config: WebPnpConfig = serde_json::from_str(&content)
            .map_err(|e| WebPnpError::Config(format!("{}: {}", path.display(), e)))?;

        if let (Some(server), Ok(password)) = (
            config.result_server.as_mut(),
            std::env::var(SERVER_PASSWORD_ENV),
        ) {
            server.password = password;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for workload in &self.workloads {
            workload.validate()?;
            if !seen.insert(workload.name.as_str()) {
                return Err(WebPnpError::Config(format!(
                    "duplicate workload: {}",
                    workload.name
                )));
            }
        }
        Ok(())
    }

    /// Sync runs around each workload only outside dev mode and with a server configured
    pub fn sync_enabled(&self) -> bool {
        !self.dev_mode && self.result_server.is_some()
    }

    pub fn workload(&self, name: &str) -> Result<&WorkloadSpec> {
        self.workloads
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| WebPnpError::UnknownWorkload(name.to_string()))
    }
}

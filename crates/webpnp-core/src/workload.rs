use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, WebPnpError};

/// Workloads whose first run is discarded before measuring
pub const WARMUP_WORKLOADS: &[&str] = &["Unity3D", "Speedometer2"];

/// One benchmark suite as configured. Fields the orchestrator does not read
/// (url, driver options) are kept in `extra` for the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub run_times: u32,
    /// Seconds to pause after each round, fractions allowed
    #[serde(default)]
    pub sleep_interval: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorkloadSpec {
    pub fn new(name: impl Into<String>, run_times: u32, sleep_interval: f64) -> Self {
        Self {
            name: name.into(),
            run_times,
            sleep_interval,
            url: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn needs_warmup(&self) -> bool {
        WARMUP_WORKLOADS.contains(&self.name.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(WebPnpError::Config("workload name is empty".to_string()));
        }
        if self.run_times == 0 {
            return Err(WebPnpError::ZeroRunTimes {
                workload: self.name.clone(),
            });
        }
        if Duration::try_from_secs_f64(self.sleep_interval).is_err() {
            return Err(WebPnpError::Config(format!(
                "workload {} has invalid sleep_interval {}",
                self.name, self.sleep_interval
            )));
        }
        Ok(())
    }

    /// Zero when the interval does not pass `validate`
    pub fn sleep_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.sleep_interval).unwrap_or_default()
    }
}

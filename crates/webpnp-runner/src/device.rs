use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;
use webpnp_core::{DeviceInfo, WebPnpError};

use crate::error::{Result, RunnerError};

/// Source of the device description recorded with every result
#[async_trait]
pub trait DeviceInfoProvider: Send + Sync {
    async fn device_info(&self) -> Result<DeviceInfo>;
}

/// Reads a device info document written by the environment probe
pub struct JsonDeviceInfoProvider {
    path: PathBuf,
}

impl JsonDeviceInfoProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceInfoProvider for JsonDeviceInfoProvider {
    async fn device_info(&self) -> Result<DeviceInfo> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| WebPnpError::io(&self.path, e))?;

        let device: DeviceInfo = serde_json::from_str(&content)
            .map_err(|e| RunnerError::DeviceInfo(format!("{}: {}", self.path.display(), e)))?;

        info!("Device: {} / {}", device.cpu_label(), device.browser);
        Ok(device)
    }
}

/// Fixed device info, for callers that probe the device themselves
#[async_trait]
impl DeviceInfoProvider for DeviceInfo {
    async fn device_info(&self) -> Result<DeviceInfo> {
        Ok(self.clone())
    }
}

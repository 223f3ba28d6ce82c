use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub mfr: String,
    pub info: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Device description produced by the environment probe.
/// Only `CPU` and `Browser` are read here; everything else passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "CPU")]
    pub cpu: CpuInfo,
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceInfo {
    pub fn new(mfr: impl Into<String>, cpu_info: impl Into<String>, browser: impl Into<String>) -> Self {
        Self {
            cpu: CpuInfo {
                mfr: mfr.into(),
                info: cpu_info.into(),
                extra: serde_json::Map::new(),
            },
            browser: browser.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// `<mfr>-<info>` with whitespace in `info` replaced by hyphens
    pub fn cpu_label(&self) -> String {
        let info: String = self
            .cpu
            .info
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .collect();
        format!("{}-{}", self.cpu.mfr, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_label_normalizes_whitespace() {
        let device = DeviceInfo::new("Intel", "TigerLake i7-1165G7", "Chrome-Canary-90.0.4400.0");
        assert_eq!(device.cpu_label(), "Intel-TigerLake-i7-1165G7");

        let device = DeviceInfo::new("AMD", "Renoir Ryzen 7\t4700U", "x");
        assert_eq!(device.cpu_label(), "AMD-Renoir-Ryzen-7-4700U");
    }

    #[test]
    fn test_passthrough_fields() {
        let json = r#"{
            "CPU": {"mfr": "Intel", "info": "IceLake i5-1035G1", "codename": "IceLake", "brand": "i5-1035G1"},
            "GPU": "UHD Graphics",
            "Memory": "16G",
            "Browser": "Chrome-Stable-89.0.4389.90"
        }"#;
        let device: DeviceInfo = serde_json::from_str(json).unwrap();

        assert_eq!(device.browser, "Chrome-Stable-89.0.4389.90");
        assert_eq!(device.cpu.extra.get("codename"), Some(&serde_json::json!("IceLake")));
        assert_eq!(device.extra.get("GPU"), Some(&serde_json::json!("UHD Graphics")));

        let back: serde_json::Value = serde_json::to_value(&device).unwrap();
        assert_eq!(back["Memory"], "16G");
        assert_eq!(back["CPU"]["brand"], "i5-1035G1");
    }
}

pub mod config;
pub mod device;
pub mod error;
pub mod platform;
pub mod result;
pub mod score;
pub mod workload;

pub use config::{ExecutorCommandConfig, ResultServerConfig, WebPnpConfig, SERVER_PASSWORD_ENV};
pub use device::{CpuInfo, DeviceInfo};
pub use error::{Result, WebPnpError};
pub use platform::platform_name;
pub use result::{PersistedResult, ResultManifest, SelectionResult};
pub use score::{RunBatch, ScoreRecord, ScoreValue, TOTAL_SCORE};
pub use workload::{WorkloadSpec, WARMUP_WORKLOADS};

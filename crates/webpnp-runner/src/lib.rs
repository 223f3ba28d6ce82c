pub mod archive;
pub mod command;
pub mod device;
pub mod error;
pub mod executor;
pub mod runner;
pub mod search;
pub mod selector;
pub mod sftp;
pub mod store;
pub mod suite;
pub mod sync;

pub use archive::{ArchiveConnector, ArchiveSession};
pub use command::CommandExecutor;
pub use device::{DeviceInfoProvider, JsonDeviceInfoProvider};
pub use error::{Result, RunPhase, RunnerError};
pub use executor::{ExecutorError, ExecutorRegistry, WorkloadExecutor};
pub use runner::{WorkloadRunner, WARMUP_COOLDOWN};
pub use search::{pull_all, search_results};
pub use selector::{median_index, select_median};
pub use sftp::SftpConnector;
pub use store::{result_file_name, ResultStore};
pub use suite::SuiteRunner;
pub use sync::{RemoteSync, SyncDirection, SyncReport};

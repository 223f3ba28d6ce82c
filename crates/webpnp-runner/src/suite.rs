use std::sync::Arc;

use tracing::{error, info, warn};
use webpnp_core::{DeviceInfo, PersistedResult, ResultManifest, WebPnpConfig, WorkloadSpec};

use crate::device::DeviceInfoProvider;
use crate::error::Result;
use crate::executor::{ExecutorRegistry, WorkloadExecutor};
use crate::runner::WorkloadRunner;
use crate::store::ResultStore;
use crate::sync::{RemoteSync, SyncDirection};

/// Runs every workload in order and collects where each result was written.
///
/// All workload names are resolved against the registry before anything
/// runs. Any execution or storage error aborts the suite without a manifest;
/// results already written for earlier workloads stay on disk. Sync errors
/// around a workload are logged and the suite carries on.
pub struct SuiteRunner {
    registry: ExecutorRegistry,
    runner: WorkloadRunner,
    store: ResultStore,
    chrome_flags: Vec<String>,
    sync: Option<RemoteSync>,
}

impl SuiteRunner {
    pub fn new(config: &WebPnpConfig, registry: ExecutorRegistry) -> Self {
        Self {
            registry,
            runner: WorkloadRunner::new(),
            store: ResultStore::new(&config.results_root),
            chrome_flags: config.chrome_flags.clone(),
            sync: None,
        }
    }

    pub fn with_runner(mut self, runner: WorkloadRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Pull before and push after each workload
    pub fn with_sync(mut self, sync: RemoteSync) -> Self {
        self.sync = Some(sync);
        self
    }

    pub async fn run(
        &self,
        provider: &dyn DeviceInfoProvider,
        workloads: &[WorkloadSpec],
    ) -> Result<ResultManifest> {
        let device = provider.device_info().await?;
        self.run_suite(&device, workloads).await
    }

    pub async fn run_suite(
        &self,
        device: &DeviceInfo,
        workloads: &[WorkloadSpec],
    ) -> Result<ResultManifest> {
        let plan = self.resolve(workloads)?;
        info!("Running {} workloads", plan.len());

        let mut manifest = ResultManifest::new();
        for (workload, executor) in plan {
            let path = self.run_workload(device, workload, executor.as_ref()).await?;
            manifest.insert(workload.name.clone(), path);
        }

        info!("Suite complete");
        Ok(manifest)
    }

    fn resolve<'a>(
        &self,
        workloads: &'a [WorkloadSpec],
    ) -> Result<Vec<(&'a WorkloadSpec, Arc<dyn WorkloadExecutor>)>> {
        workloads
            .iter()
            .map(|workload| -> Result<(&'a WorkloadSpec, Arc<dyn WorkloadExecutor>)> {
                workload.validate()?;
                let executor = self.registry.get(&workload.name)?;
                Ok((workload, executor))
            })
            .collect()
    }

    async fn run_workload(
        &self,
        device: &DeviceInfo,
        workload: &WorkloadSpec,
        executor: &dyn WorkloadExecutor,
    ) -> Result<std::path::PathBuf> {
        self.sync_step(workload, SyncDirection::Pull).await;

        let selection = self.runner.run(workload, executor, &self.chrome_flags).await?;
        let payload = PersistedResult::new(workload, device, selection, &self.chrome_flags);
        let path = self.store.store(device, workload, payload).await?;

        self.sync_step(workload, SyncDirection::Push).await;
        Ok(path)
    }

    async fn sync_step(&self, workload: &WorkloadSpec, direction: SyncDirection) {
        let Some(sync) = &self.sync else {
            return;
        };

        match sync.sync(workload, direction).await {
            Ok(report) if !report.is_complete() => {
                warn!(
                    "{} of {} left {} files untransferred: {:?}",
                    direction,
                    workload.name,
                    report.failed.len(),
                    report.failed
                );
            }
            Ok(_) => {}
            Err(e) => error!("{} of {} failed, continuing: {}", direction, workload.name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testing::MemoryArchive;
    use crate::error::RunnerError;
    use crate::executor::testing::ScriptedExecutor;
    use crate::sync::list_local_files;
    use std::time::Duration;
    use tempfile::TempDir;
    use webpnp_core::{platform_name, WebPnpError};

    fn device() -> DeviceInfo {
        DeviceInfo::new("Intel", "TigerLake i7-1165G7", "Chrome-Canary-90.0.4400.0")
    }

    fn config(tmp: &TempDir) -> WebPnpConfig {
        WebPnpConfig {
            results_root: tmp.path().to_path_buf(),
            chrome_flags: vec!["--enable-features=Vulkan".to_string()],
            ..WebPnpConfig::default()
        }
    }

    fn suite(config: &WebPnpConfig, registry: ExecutorRegistry) -> SuiteRunner {
        SuiteRunner::new(config, registry)
            .with_runner(WorkloadRunner::new().with_warmup_cooldown(Duration::ZERO))
    }

    fn files(tmp: &TempDir, workload: &str) -> Vec<String> {
        let dir = tmp.path().join(platform_name()).join(workload);
        if !dir.exists() {
            return Vec::new();
        }
        list_local_files(&dir).unwrap()
    }

    #[tokio::test]
    async fn test_manifest_points_at_persisted_results() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let mut registry = ExecutorRegistry::new();
        registry.register("JetStream2", Arc::new(ScriptedExecutor::new(vec![10.0, 30.0, 20.0])));
        registry.register("Aquarium", Arc::new(ScriptedExecutor::new(vec![60.0])));
        let workloads = vec![
            WorkloadSpec::new("JetStream2", 3, 0.0),
            WorkloadSpec::new("Aquarium", 1, 0.0),
        ];

        let manifest = suite(&config, registry)
            .run_suite(&device(), &workloads)
            .await
            .unwrap();

        assert_eq!(manifest.len(), 2);
        let result = ResultStore::load(&manifest["JetStream2"]).unwrap();
        assert_eq!(result.workload, "JetStream2");
        assert_eq!(result.selected_round, 2);
        assert_eq!(result.test_rounds.len(), 3);
        assert_eq!(result.execution_date, "run-2");
        assert_eq!(result.chrome_flags, config.chrome_flags);
        assert_eq!(result.device_info, device());

        assert!(manifest["Aquarium"].starts_with(tmp.path()));
    }

    #[tokio::test]
    async fn test_unknown_workload_fails_before_running() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let executor = Arc::new(ScriptedExecutor::new(vec![1.0]));
        let mut registry = ExecutorRegistry::new();
        registry.register("JetStream2", executor.clone());
        let workloads = vec![
            WorkloadSpec::new("JetStream2", 1, 0.0),
            WorkloadSpec::new("Octane", 1, 0.0),
        ];

        let err = suite(&config, registry)
            .run_suite(&device(), &workloads)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RunnerError::Core(WebPnpError::UnknownWorkload(name)) if name == "Octane"
        ));
        assert_eq!(executor.calls(), 0);
        assert!(files(&tmp, "JetStream2").is_empty());
    }

    #[tokio::test]
    async fn test_failure_aborts_suite_and_keeps_earlier_results() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let a = Arc::new(ScriptedExecutor::new(vec![1.0, 2.0, 3.0]).failing_on(1));
        let b = Arc::new(ScriptedExecutor::new(vec![1.0]));
        let done = Arc::new(ScriptedExecutor::new(vec![5.0]));
        let mut registry = ExecutorRegistry::new();
        registry.register("A", a.clone());
        registry.register("B", b.clone());
        registry.register("Done", done.clone());
        let workloads = vec![
            WorkloadSpec::new("Done", 1, 0.0),
            WorkloadSpec::new("A", 3, 0.0),
            WorkloadSpec::new("B", 3, 0.0),
        ];

        let err = suite(&config, registry)
            .run_suite(&device(), &workloads)
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::Execution { ref workload, .. } if workload == "A"));
        assert_eq!(a.calls(), 2);
        assert_eq!(b.calls(), 0);
        assert_eq!(files(&tmp, "Done").len(), 1);
        assert!(files(&tmp, "A").is_empty());
        assert!(files(&tmp, "B").is_empty());
    }

    #[tokio::test]
    async fn test_sync_around_each_workload() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let archive = MemoryArchive::default();
        let mut registry = ExecutorRegistry::new();
        registry.register("WebXPRT3", Arc::new(ScriptedExecutor::new(vec![100.0])));
        let sync = RemoteSync::new(
            Arc::new(archive.clone()),
            ResultStore::new(tmp.path()),
            "/archive",
        );

        let manifest = suite(&config, registry)
            .with_sync(sync)
            .run_suite(&device(), &[WorkloadSpec::new("WebXPRT3", 1, 0.0)])
            .await
            .unwrap();

        let name = manifest["WebXPRT3"].file_name().unwrap().to_str().unwrap().to_string();
        let state = archive.state();
        assert_eq!(state.connects, 2);
        assert_eq!(state.disconnects, 2);
        assert_eq!(state.uploads, vec![name]);
    }

    #[tokio::test]
    async fn test_sync_failure_does_not_abort_suite() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let archive = MemoryArchive::default();
        archive.state().refuse_connect = true;
        let mut registry = ExecutorRegistry::new();
        registry.register("WebXPRT3", Arc::new(ScriptedExecutor::new(vec![100.0])));
        let sync = RemoteSync::new(Arc::new(archive), ResultStore::new(tmp.path()), "/archive");

        let manifest = suite(&config, registry)
            .with_sync(sync)
            .run_suite(&device(), &[WorkloadSpec::new("WebXPRT3", 1, 0.0)])
            .await
            .unwrap();

        assert!(manifest["WebXPRT3"].exists());
    }

    #[tokio::test]
    async fn test_device_provider_is_used() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let mut registry = ExecutorRegistry::new();
        registry.register("Aquarium", Arc::new(ScriptedExecutor::new(vec![60.0])));

        let manifest = suite(&config, registry)
            .run(&device(), &[WorkloadSpec::new("Aquarium", 1, 0.0)])
            .await
            .unwrap();

        let name = manifest["Aquarium"].file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_Intel-TigerLake-i7-1165G7_Chrome-Canary-90.0.4400.0.json"));
    }
}

use std::path::Path;

use tracing::info;
use webpnp_core::{ResultManifest, WorkloadSpec};

use crate::error::{Result, RunnerError};
use crate::sync::{list_local_files, RemoteSync, SyncDirection, SyncReport};

/// Pulls every workload's remote directory, one after another
pub async fn pull_all(sync: &RemoteSync, workloads: &[WorkloadSpec]) -> Result<Vec<SyncReport>> {
    let mut reports = Vec::with_capacity(workloads.len());
    for workload in workloads {
        reports.push(sync.sync(workload, SyncDirection::Pull).await?);
    }
    Ok(reports)
}

/// Finds the single result per workload from one round of regular testing.
///
/// Each workload directory is pulled first, then a file matches when its
/// name contains the CPU, the browser channel and the browser version.
pub async fn search_results(
    sync: &RemoteSync,
    workloads: &[WorkloadSpec],
    cpu: &str,
    browser_channel: &str,
    browser_version: &str,
) -> Result<ResultManifest> {
    let keywords = [cpu, browser_channel, browser_version];
    let mut manifest = ResultManifest::new();

    for workload in workloads {
        let report = sync.sync(workload, SyncDirection::Pull).await?;
        let found = matching_files(&report.local_dir, &keywords)
            .map_err(|e| RunnerError::store(&workload.name, &report.local_dir, e))?;

        let [name] = found.as_slice() else {
            return Err(RunnerError::AmbiguousSearch {
                workload: workload.name.clone(),
                found: found.len(),
            });
        };

        manifest.insert(workload.name.clone(), report.local_dir.join(name));
    }

    info!("Found {} results", manifest.len());
    Ok(manifest)
}

fn matching_files(dir: &Path, keywords: &[&str]) -> std::io::Result<Vec<String>> {
    Ok(list_local_files(dir)?
        .into_iter()
        .filter(|name| keywords.iter().all(|k| name.contains(k)))
        .collect())
}

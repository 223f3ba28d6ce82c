//! Reconciles a workload's local result directory with the remote archive.
//!
//! Files are matched by name only. Pull downloads remote files missing
//! locally, push uploads local files missing remotely. A file that exists on
//! both sides is never transferred, even if its contents differ.
//!
//! Each call opens exactly one archive session and always disconnects it. A
//! failed transfer is logged and recorded in the report; the remaining files
//! are still attempted. Failures to connect, create or list the remote
//! directory end the call with an error after the session is released.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, instrument, warn, Span};
use webpnp_core::{platform_name, WebPnpConfig, WorkloadSpec};

use crate::archive::{ArchiveConnector, ArchiveSession};
use crate::error::{Result, RunnerError};
use crate::sftp::SftpConnector;
use crate::store::ResultStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Pull,
    Push,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Pull => f.write_str("pull"),
            SyncDirection::Push => f.write_str("push"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub workload: String,
    pub direction: SyncDirection,
    pub local_dir: PathBuf,
    pub remote_dir: String,
    pub transferred: Vec<String>,
    pub failed: Vec<String>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct RemoteSync {
    connector: Arc<dyn ArchiveConnector>,
    store: ResultStore,
    archive_root: String,
}

impl RemoteSync {
    pub fn new(
        connector: Arc<dyn ArchiveConnector>,
        store: ResultStore,
        archive_root: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            store,
            archive_root: archive_root.into(),
        }
    }

    /// SFTP sync against `config.result_server`
    pub fn from_config(config: &WebPnpConfig) -> Result<Self> {
        let server = config.result_server.as_ref().ok_or(RunnerError::NoResultServer)?;
        Ok(Self::new(
            Arc::new(SftpConnector::new(server)),
            ResultStore::new(&config.results_root),
            server.archive_root(),
        ))
    }

    pub fn remote_dir(&self, workload: &str) -> String {
        format!(
            "{}/{}/{}",
            self.archive_root.trim_end_matches('/'),
            platform_name(),
            workload
        )
    }

    #[instrument(skip_all, fields(workload = %workload.name, %direction))]
    pub async fn sync(&self, workload: &WorkloadSpec, direction: SyncDirection) -> Result<SyncReport> {
        let local_dir = self.store.workload_dir(&workload.name)?;
        let remote_dir = self.remote_dir(&workload.name);
        let connector = self.connector.clone();
        let name = workload.name.clone();
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                sync_blocking(connector.as_ref(), &name, direction, local_dir, remote_dir)
            })
        })
        .await?
    }
}

fn sync_blocking(
    connector: &dyn ArchiveConnector,
    workload: &str,
    direction: SyncDirection,
    local_dir: PathBuf,
    remote_dir: String,
) -> Result<SyncReport> {
    let mut session = connector
        .connect()
        .map_err(|e| RunnerError::sync(workload, "connect", e))?;

    let outcome = reconcile(session.as_mut(), workload, direction, &local_dir, &remote_dir);

    if let Err(e) = session.disconnect() {
        warn!("Failed to close archive session for {}: {}", workload, e);
    }

    let (transferred, failed) = outcome?;
    info!(
        "{} {}: {} transferred, {} failed",
        direction,
        workload,
        transferred.len(),
        failed.len()
    );

    Ok(SyncReport {
        workload: workload.to_string(),
        direction,
        local_dir,
        remote_dir,
        transferred,
        failed,
    })
}

fn reconcile(
    session: &mut dyn ArchiveSession,
    workload: &str,
    direction: SyncDirection,
    local_dir: &Path,
    remote_dir: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let exists = session
        .exists(remote_dir)
        .map_err(|e| RunnerError::sync(workload, "stat remote directory", e))?;
    if !exists {
        debug!("Creating remote directory {}", remote_dir);
        session
            .create_dir_all(remote_dir)
            .map_err(|e| RunnerError::sync(workload, "create remote directory", e))?;
    }

    let remote_files: Vec<String> = session
        .list_files(remote_dir)
        .map_err(|e| RunnerError::sync(workload, "list remote directory", e))?
        .into_iter()
        .filter(|name| is_result_file(name))
        .collect();

    let mut transferred = Vec::new();
    let mut failed = Vec::new();

    match direction {
        SyncDirection::Pull => {
            for name in remote_files {
                if local_dir.join(&name).exists() {
                    continue;
                }
                let remote = format!("{}/{}", remote_dir, name);
                info!("Downloading remote file: {}", name);
                match download(session, &remote, local_dir, &name) {
                    Ok(()) => transferred.push(name),
                    Err(e) => {
                        error!("Failed to download {}: {}", remote, e);
                        failed.push(name);
                    }
                }
            }
        }
        SyncDirection::Push => {
            let remote: HashSet<String> = remote_files.into_iter().collect();
            let local_files = list_local_files(local_dir)
                .map_err(|e| RunnerError::store(workload, local_dir, e))?;

            for name in local_files {
                if remote.contains(&name) {
                    continue;
                }
                let target = format!("{}/{}", remote_dir, name);
                info!("Uploading local file: {}", name);
                match upload(session, &local_dir.join(&name), &target) {
                    Ok(()) => transferred.push(name),
                    Err(e) => {
                        error!("Failed to upload {}: {}", name, e);
                        failed.push(name);
                    }
                }
            }
        }
    }

    Ok((transferred, failed))
}

fn download(
    session: &mut dyn ArchiveSession,
    remote: &str,
    local_dir: &Path,
    name: &str,
) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(local_dir)?;
    session.download(remote, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(local_dir.join(name)).map_err(|e| e.error)?;
    Ok(())
}

fn upload(session: &mut dyn ArchiveSession, local: &Path, remote: &str) -> std::io::Result<()> {
    let mut file = File::open(local)?;
    session.upload(&mut file, remote)?;
    Ok(())
}

/// Hidden entries and interrupted uploads are not results
fn is_result_file(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(".part")
}

/// Sorted names of the result files in `dir`
pub(crate) fn list_local_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_result_file(name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

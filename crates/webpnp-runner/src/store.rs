use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{info, Span};
use webpnp_core::{platform_name, DeviceInfo, PersistedResult, WebPnpError, WorkloadSpec};

use crate::error::{Result, RunnerError};

/// Result file layout: `<root>/<platform>/<workload>/<file>.json`
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

/// `YYYYMMDDHHMMSS_<mfr>-<cpu info>_<browser>.json`, timestamp in the zone of `at`
pub fn result_file_name<Tz>(at: &DateTime<Tz>, device: &DeviceInfo) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}_{}_{}.json",
        at.format("%Y%m%d%H%M%S"),
        device.cpu_label(),
        device.browser
    )
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute local directory for `workload`, created if missing
    pub fn workload_dir(&self, workload: &str) -> Result<PathBuf> {
        let dir = absolute(&self.root.join(platform_name()).join(workload))
            .map_err(|e| RunnerError::store(workload, &self.root, e))?;
        std::fs::create_dir_all(&dir).map_err(|e| RunnerError::store(workload, &dir, e))?;
        Ok(dir)
    }

    /// Writes `payload` under local time and returns the absolute file path.
    /// The file system work runs on the blocking pool.
    pub async fn store<T>(
        &self,
        device: &DeviceInfo,
        workload: &WorkloadSpec,
        payload: T,
    ) -> Result<PathBuf>
    where
        T: Serialize + Send + 'static,
    {
        let store = self.clone();
        let device = device.clone();
        let workload = workload.clone();
        let at = Local::now();
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| store.store_at(&device, &workload, &payload, &at))
        })
        .await?
    }

    pub fn store_at<T, Tz>(
        &self,
        device: &DeviceInfo,
        workload: &WorkloadSpec,
        payload: &T,
        at: &DateTime<Tz>,
    ) -> Result<PathBuf>
    where
        T: Serialize,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let dir = self.workload_dir(&workload.name)?;
        let path = dir.join(result_file_name(at, device));
        let json = to_pretty_json(payload)?;

        write_atomic(&dir, &path, &json).map_err(|e| RunnerError::store(&workload.name, &path, e))?;

        info!("Stored {} result at {}", workload.name, path.display());
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<PersistedResult> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| WebPnpError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Pretty JSON with four-space indentation
fn to_pretty_json<T: Serialize>(payload: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    payload.serialize(&mut serializer)?;
    Ok(buf)
}

/// Temp file in the target directory, then rename over `path`
fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use tempfile::TempDir;
    use webpnp_core::{ScoreRecord, SelectionResult, TOTAL_SCORE};

    fn device() -> DeviceInfo {
        DeviceInfo::new("Intel", "TigerLake i7-1165G7", "Chrome-Canary-90.0.4400.0")
    }

    fn payload(workload: &WorkloadSpec) -> PersistedResult {
        let rounds = vec![
            ScoreRecord::new("2024-05-01T08:00:00Z").with_score(TOTAL_SCORE, 120.5),
            ScoreRecord::new("2024-05-01T08:01:00Z").with_score(TOTAL_SCORE, 118.0),
        ];
        let selection = SelectionResult {
            middle_score: rounds[0].clone(),
            selected_round: 0,
            detailed_scores: rounds,
        };
        PersistedResult::new(workload, &device(), selection, &["--no-sandbox".to_string()])
    }

    #[test]
    fn test_file_name_uses_local_wall_clock() {
        let utc = Utc.with_ymd_and_hms(2021, 3, 4, 22, 30, 5).unwrap();
        let shanghai = utc.with_timezone(&FixedOffset::east_opt(8 * 3600).unwrap());

        assert_eq!(
            result_file_name(&shanghai, &device()),
            "20210305063005_Intel-TigerLake-i7-1165G7_Chrome-Canary-90.0.4400.0.json"
        );
        assert_eq!(
            result_file_name(&utc, &device()),
            "20210304223005_Intel-TigerLake-i7-1165G7_Chrome-Canary-90.0.4400.0.json"
        );
    }

    #[test]
    fn test_store_writes_pretty_json_under_platform_dir() {
        let tmp = TempDir::new().unwrap();
        let store = ResultStore::new(tmp.path());
        let workload = WorkloadSpec::new("Speedometer2", 2, 0.0);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 2, 0).unwrap();

        let path = store.store_at(&device(), &workload, &payload(&workload), &at).unwrap();

        assert!(path.is_absolute());
        assert_eq!(
            path.parent().unwrap(),
            tmp.path().join(platform_name()).join("Speedometer2")
        );
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n    \"workload\": \"Speedometer2\""));

        let loaded = ResultStore::load(&path).unwrap();
        assert_eq!(loaded, payload(&workload));
    }

    #[test]
    fn test_directory_creation_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = ResultStore::new(tmp.path().join("nested").join("results"));
        let workload = WorkloadSpec::new("Aquarium", 1, 0.0);
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 1).unwrap();

        let a = store.store_at(&device(), &workload, &payload(&workload), &first).unwrap();
        let b = store.store_at(&device(), &workload, &payload(&workload), &second).unwrap();

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_same_name_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = ResultStore::new(tmp.path());
        let workload = WorkloadSpec::new("Aquarium", 1, 0.0);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

        store.store_at(&device(), &workload, &serde_json::json!({"v": 1}), &at).unwrap();
        let path = store.store_at(&device(), &workload, &serde_json::json!({"v": 2}), &at).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["v"], 2);

        // no temp files left next to the result
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_store_writes_from_async_context() {
        let tmp = TempDir::new().unwrap();
        let store = ResultStore::new(tmp.path());
        let workload = WorkloadSpec::new("WebXPRT3", 2, 0.0);

        let path = store.store(&device(), &workload, payload(&workload)).await.unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_Intel-TigerLake-i7-1165G7_Chrome-Canary-90.0.4400.0.json"));
        assert_eq!(name.find('_'), Some(14));
        assert_eq!(ResultStore::load(&path).unwrap(), payload(&workload));
    }

    #[test]
    fn test_unwritable_root_reports_workload() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let store = ResultStore::new(&blocker);

        let err = store.workload_dir("JetStream2").unwrap_err();
        assert!(matches!(err, RunnerError::Store { workload, .. } if workload == "JetStream2"));
    }
}

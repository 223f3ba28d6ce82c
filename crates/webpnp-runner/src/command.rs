use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use webpnp_core::{ExecutorCommandConfig, ScoreRecord, WorkloadSpec};

use crate::executor::{ExecutorError, WorkloadExecutor};

/// Env var carrying the workload spec as JSON
pub const WORKLOAD_ENV: &str = "WEBPNP_WORKLOAD";
/// Env var carrying the browser flags as a JSON array
pub const BROWSER_FLAGS_ENV: &str = "WEBPNP_BROWSER_FLAGS";

/// Runs an external browser driver and parses the score record it prints on stdout
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandExecutor {
    pub fn new(config: &ExecutorCommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl WorkloadExecutor for CommandExecutor {
    async fn execute(
        &self,
        workload: &WorkloadSpec,
        browser_flags: &[String],
    ) -> Result<ScoreRecord, ExecutorError> {
        debug!("Spawning driver {} for {}", self.program, workload.name);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(WORKLOAD_ENV, serde_json::to_string(workload)?)
            .env(BROWSER_FLAGS_ENV, serde_json::to_string(browser_flags)?)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        let timeout = Duration::from_secs(self.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(ExecutorError::Timeout(self.timeout_secs)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExecutorError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use webpnp_core::TOTAL_SCORE;

    fn shell(script: &str, timeout_secs: u64) -> CommandExecutor {
        CommandExecutor::new(&ExecutorCommandConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_secs,
        })
    }

    #[tokio::test]
    async fn test_parses_score_from_stdout() {
        let executor = shell(
            r#"test -n "$WEBPNP_WORKLOAD" && echo '{"date":"2024-01-01T00:00:00Z","scores":{"Total Score":88.5}}'"#,
            10,
        );
        let record = executor
            .execute(&WorkloadSpec::new("JetStream2", 1, 0.0), &["--no-sandbox".to_string()])
            .await
            .unwrap();

        assert_eq!(record.date, "2024-01-01T00:00:00Z");
        assert_eq!(record.numeric(TOTAL_SCORE).unwrap(), 88.5);
    }

    #[tokio::test]
    async fn test_passes_flags_as_json() {
        let executor = shell(
            r#"test "$WEBPNP_BROWSER_FLAGS" = '["--a","--b"]' && echo '{"date":"d","scores":{"Total Score":1}}'"#,
            10,
        );
        let flags = vec!["--a".to_string(), "--b".to_string()];
        assert!(executor.execute(&WorkloadSpec::new("W", 1, 0.0), &flags).await.is_ok());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let executor = shell("echo boom >&2; exit 3", 10);
        let err = executor
            .execute(&WorkloadSpec::new("W", 1, 0.0), &[])
            .await
            .unwrap_err();

        match err {
            ExecutorError::Failed(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_output_is_rejected() {
        let executor = shell("echo not-json", 10);
        let err = executor
            .execute(&WorkloadSpec::new("W", 1, 0.0), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = shell("sleep 5", 1);
        let err = executor
            .execute(&WorkloadSpec::new("W", 1, 0.0), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout(1)));
    }
}

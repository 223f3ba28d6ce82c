use std::time::Duration;

use tracing::{debug, info, instrument};
use webpnp_core::{RunBatch, SelectionResult, WorkloadSpec, TOTAL_SCORE};

use crate::error::{Result, RunPhase, RunnerError};
use crate::executor::WorkloadExecutor;
use crate::selector::select_median;

/// Pause after the discarded warm-up run
pub const WARMUP_COOLDOWN: Duration = Duration::from_secs(100);

/// Runs one workload `run_times` times and picks the median round
pub struct WorkloadRunner {
    warmup_cooldown: Duration,
    sort_field: String,
}

impl WorkloadRunner {
    pub fn new() -> Self {
        Self {
            warmup_cooldown: WARMUP_COOLDOWN,
            sort_field: TOTAL_SCORE.to_string(),
        }
    }

    pub fn with_warmup_cooldown(mut self, cooldown: Duration) -> Self {
        self.warmup_cooldown = cooldown;
        self
    }

    pub fn with_sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_field = field.into();
        self
    }

    #[instrument(skip_all, fields(workload = %workload.name, rounds = workload.run_times))]
    pub async fn run(
        &self,
        workload: &WorkloadSpec,
        executor: &dyn WorkloadExecutor,
        browser_flags: &[String],
    ) -> Result<SelectionResult> {
        workload.validate()?;
        info!("Starting workload {}", workload.name);

        if workload.needs_warmup() {
            info!("Warm-up run for {}", workload.name);
            Self::execute(workload, executor, browser_flags, RunPhase::Warmup).await?;
            debug!("Cooling down for {:?}", self.warmup_cooldown);
            tokio::time::sleep(self.warmup_cooldown).await;
        }

        let interval = workload.sleep_duration();
        let mut batch: RunBatch = Vec::with_capacity(workload.run_times as usize);

        for i in 0..workload.run_times {
            info!("Round {}/{}", i + 1, workload.run_times);
            let record = Self::execute(workload, executor, browser_flags, RunPhase::Round(i)).await?;
            batch.push(record);

            debug!("Sleeping {:?}", interval);
            tokio::time::sleep(interval).await;
        }

        let selection = select_median(&batch, &self.sort_field)?;
        info!(
            "Selected round {} of {} for {}",
            selection.selected_round + 1,
            batch.len(),
            workload.name
        );
        Ok(selection)
    }

    async fn execute(
        workload: &WorkloadSpec,
        executor: &dyn WorkloadExecutor,
        browser_flags: &[String],
        phase: RunPhase,
    ) -> Result<webpnp_core::ScoreRecord> {
        executor
            .execute(workload, browser_flags)
            .await
            .map_err(|source| RunnerError::Execution {
                workload: workload.name.clone(),
                phase,
                source,
            })
    }
}

impl Default for WorkloadRunner {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DeviceInfo, RunBatch, ScoreRecord, ScoreValue, WorkloadSpec};

/// Median pick for one workload run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub middle_score: ScoreRecord,
    /// Index of `middle_score` within `detailed_scores`
    pub selected_round: usize,
    pub detailed_scores: RunBatch,
}

/// On-disk record for one workload run. Field names are read by the report generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedResult {
    pub workload: String,
    pub device_info: DeviceInfo,
    pub test_result: BTreeMap<String, ScoreValue>,
    pub selected_round: usize,
    pub test_rounds: RunBatch,
    pub chrome_flags: Vec<String>,
    pub execution_date: String,
}

impl PersistedResult {
    pub fn new(
        workload: &WorkloadSpec,
        device_info: &DeviceInfo,
        selection: SelectionResult,
        chrome_flags: &[String],
    ) -> Self {
        let SelectionResult {
            middle_score,
            selected_round,
            detailed_scores,
        } = selection;

        Self {
            workload: workload.name.clone(),
            device_info: device_info.clone(),
            test_result: middle_score.scores,
            selected_round,
            test_rounds: detailed_scores,
            chrome_flags: chrome_flags.to_vec(),
            execution_date: middle_score.date,
        }
    }
}

/// Workload name to absolute path of its persisted result
pub type ResultManifest = BTreeMap<String, PathBuf>;

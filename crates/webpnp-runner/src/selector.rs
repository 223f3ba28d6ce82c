//! Median round selection.
//!
//! Rounds are ranked by a numeric score field and the round at rank
//! `round((n - 1) / 2)` is picked, rounding halves away from zero. For
//! non-negative inputs that is exactly `n / 2` in integer arithmetic, so an
//! even count selects the upper of the two middle rounds. When several rounds
//! share the median value the earliest one wins.

use std::cmp::Ordering;

use webpnp_core::{Result, ScoreRecord, SelectionResult, WebPnpError};

/// Rank of the median element in a batch of `len` rounds
pub fn median_index(len: usize) -> usize {
    len / 2
}

/// Picks the median round of `batch` by `field`. The batch is left untouched.
pub fn select_median(batch: &[ScoreRecord], field: &str) -> Result<SelectionResult> {
    if batch.is_empty() {
        return Err(WebPnpError::EmptyBatch);
    }

    let mut ranked = batch
        .iter()
        .enumerate()
        .map(|(round, record)| record.numeric(field).map(|value| (round, value)))
        .collect::<Result<Vec<(usize, f64)>>>()?;

    // Stable: equal values keep execution order
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

    let median_value = ranked[median_index(ranked.len())].1;
    let selected_round = ranked
        .iter()
        .find(|(_, value)| value.total_cmp(&median_value) == Ordering::Equal)
        .map(|(round, _)| *round)
        .unwrap_or(ranked[median_index(ranked.len())].0);

    Ok(SelectionResult {
        middle_score: batch[selected_round].clone(),
        selected_round,
        detailed_scores: batch.to_vec(),
    })
}

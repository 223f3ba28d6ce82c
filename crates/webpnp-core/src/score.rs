use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, WebPnpError};

/// Metric every workload driver reports and the default median sort key
pub const TOTAL_SCORE: &str = "Total Score";

/// A single metric value as reported by a workload driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Text(String),
}

impl ScoreValue {
    /// Numeric view of the value. Text is parsed as a float; non-finite results are rejected.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            ScoreValue::Number(n) => *n,
            ScoreValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreValue::Number(n) => write!(f, "{}", n),
            ScoreValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Number(value)
    }
}

impl From<&str> for ScoreValue {
    fn from(value: &str) -> Self {
        ScoreValue::Text(value.to_string())
    }
}

/// One round's output: execution timestamp plus named metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: String,
    pub scores: BTreeMap<String, ScoreValue>,
}

/// Rounds of one workload in execution order
pub type RunBatch = Vec<ScoreRecord>;

impl ScoreRecord {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            scores: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, name: impl Into<String>, value: impl Into<ScoreValue>) -> Self {
        self.scores.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&ScoreValue> {
        self.scores.get(field)
    }

    pub fn numeric(&self, field: &str) -> Result<f64> {
        let value = self.scores.get(field).ok_or_else(|| WebPnpError::MissingScore {
            field: field.to_string(),
        })?;

        value.as_f64().ok_or_else(|| WebPnpError::NonNumericScore {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn total_score(&self) -> Result<f64> {
        self.numeric(TOTAL_SCORE)
    }
}

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::table::RunMetrics;

pub const SUCCESS_STATUS: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilverSummary {
    pub input_key: String,
    pub output_key: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoldSummary {
    pub input_key: String,
    pub prediction_key: String,
    pub metrics_key: String,
    pub latest_key: String,
    pub metrics: RunMetrics,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The key was outside the stage's source tier; nothing was read or written.
    Skipped { key: String, reason: String },
    Silver(SilverSummary),
    Gold(GoldSummary),
}

impl StageOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }
}

/// Wire result handed back to the trigger: status plus a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl From<&StageOutcome> for InvocationResult {
    fn from(outcome: &StageOutcome) -> Self {
        let body = match outcome {
            StageOutcome::Skipped { reason, .. } => reason.clone(),
            StageOutcome::Silver(summary) => json!({
                "message": "Bronze to Silver success",
                "input_key": summary.input_key,
                "output_key": summary.output_key,
                "rows": summary.rows,
            })
            .to_string(),
            StageOutcome::Gold(summary) => json!({
                "message": "Silver to Gold success",
                "input_key": summary.input_key,
                "prediction_key": summary.prediction_key,
                "metrics_key": summary.metrics_key,
                "latest_key": summary.latest_key,
            })
            .to_string(),
        };

        InvocationResult {
            status_code: SUCCESS_STATUS,
            body,
        }
    }
}

impl From<StageOutcome> for InvocationResult {
    fn from(outcome: StageOutcome) -> Self {
        InvocationResult::from(&outcome)
    }
}

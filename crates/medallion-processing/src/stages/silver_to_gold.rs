use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use medallion_bucket::BucketStore;

use super::{fetch_table, put_table, Stage};
use crate::config::PipelineConfig;
use crate::error::ProcessingError;
use crate::event::ObjectLocation;
use crate::keys::{base_name, run_timestamp, GoldKeys};
use crate::outcome::{GoldSummary, StageOutcome};
use crate::table::{mean_score, score_rows, RunMetrics};

/// Scores a silver table and publishes predictions, metrics and the latest snapshot.
///
/// The three writes are independent: a failure after the first leaves the
/// earlier objects in place and fails the invocation.
#[derive(Clone)]
pub struct SilverToGold {
    store: Arc<dyn BucketStore>,
    config: Arc<PipelineConfig>,
}

impl SilverToGold {
    pub fn new(store: Arc<dyn BucketStore>, config: Arc<PipelineConfig>) -> Self {
        Self { store, config }
    }

    /// `process` with an explicit clock for the gold key timestamp.
    pub async fn process_at(
        &self,
        location: &ObjectLocation,
        now: DateTime<Utc>,
    ) -> Result<StageOutcome, ProcessingError> {
        if let Some(skipped) = self.skip_outside_tier(location) {
            return Ok(skipped);
        }
        let result = self.execute_at(location, now).await;
        self.report(location, result)
    }

    async fn execute_at(
        &self,
        location: &ObjectLocation,
        now: DateTime<Utc>,
    ) -> Result<StageOutcome, ProcessingError> {
        let table = fetch_table(self.store.as_ref(), location).await?;
        let (scored, scores) = score_rows(&table)?;

        let timestamp = run_timestamp(now);
        let keys = GoldKeys::new(&self.config, base_name(&location.key), &timestamp);

        let metrics = RunMetrics {
            source_key: location.key.clone(),
            rows: table.height(),
            columns: table.width(),
            generated_at_utc: timestamp,
            demo_score_mean: mean_score(&scores),
        };

        let bucket = location.bucket.as_str();
        put_table(self.store.as_ref(), bucket, &keys.predictions, &scored).await?;
        put_table(self.store.as_ref(), bucket, &keys.metrics, &metrics.to_frame()?).await?;
        put_table(self.store.as_ref(), bucket, &keys.latest, &scored).await?;

        Ok(StageOutcome::Gold(GoldSummary {
            input_key: location.key.clone(),
            prediction_key: keys.predictions,
            metrics_key: keys.metrics,
            latest_key: keys.latest,
            metrics,
        }))
    }
}

#[async_trait]
impl Stage for SilverToGold {
    fn name(&self) -> &'static str {
        "silver_to_gold"
    }

    fn source_prefix(&self) -> &str {
        &self.config.silver_prefix
    }

    fn skip_message(&self) -> &'static str {
        "Skipped non-silver object"
    }

    async fn execute(&self, location: &ObjectLocation) -> Result<StageOutcome, ProcessingError> {
        self.execute_at(location, Utc::now()).await
    }
}

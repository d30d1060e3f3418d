use std::sync::Arc;

use async_trait::async_trait;
use medallion_bucket::BucketStore;

use super::{fetch_table, put_table, Stage};
use crate::config::PipelineConfig;
use crate::error::ProcessingError;
use crate::event::ObjectLocation;
use crate::keys::retier_key;
use crate::outcome::{SilverSummary, StageOutcome};
use crate::table::{drop_duplicate_rows, normalize_columns};

/// Cleans a raw table: normalized headers, exact duplicate rows removed.
/// The silver object keeps the bronze sub-path and file name.
#[derive(Clone)]
pub struct BronzeToSilver {
    store: Arc<dyn BucketStore>,
    config: Arc<PipelineConfig>,
}

impl BronzeToSilver {
    pub fn new(store: Arc<dyn BucketStore>, config: Arc<PipelineConfig>) -> Self {
        Self { store, config }
    }

    pub fn output_key(&self, input_key: &str) -> String {
        retier_key(
            input_key,
            &self.config.bronze_prefix,
            &self.config.silver_prefix,
        )
    }
}

#[async_trait]
impl Stage for BronzeToSilver {
    fn name(&self) -> &'static str {
        "bronze_to_silver"
    }

    fn source_prefix(&self) -> &str {
        &self.config.bronze_prefix
    }

    fn skip_message(&self) -> &'static str {
        "Skipped non-bronze object"
    }

    async fn execute(&self, location: &ObjectLocation) -> Result<StageOutcome, ProcessingError> {
        let raw = fetch_table(self.store.as_ref(), location).await?;
        let cleaned = drop_duplicate_rows(normalize_columns(raw)?)?;

        let output_key = self.output_key(&location.key);
        put_table(self.store.as_ref(), &location.bucket, &output_key, &cleaned).await?;

        Ok(StageOutcome::Silver(SilverSummary {
            input_key: location.key.clone(),
            output_key,
            rows: cleaned.height(),
        }))
    }
}

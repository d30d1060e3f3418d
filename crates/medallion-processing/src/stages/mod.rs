//! The two tier transitions and the invocation flow they share.

mod bronze_to_silver;
mod silver_to_gold;

use async_trait::async_trait;
use bytes::Bytes;
use medallion_bucket::BucketStore;
use polars::prelude::DataFrame;
use serde_json::Value;
use tracing::{error, info};

use crate::error::ProcessingError;
use crate::event::{ObjectLocation, TriggerEvent};
use crate::keys::is_under_prefix;
use crate::outcome::StageOutcome;
use crate::table::{read_csv, write_csv};

pub use bronze_to_silver::BronzeToSilver;
pub use silver_to_gold::SilverToGold;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tier prefix this stage consumes, without a trailing slash.
    fn source_prefix(&self) -> &str;

    fn skip_message(&self) -> &'static str;

    /// Reads, transforms and writes. Callers go through `process`, which gates first.
    async fn execute(&self, location: &ObjectLocation) -> Result<StageOutcome, ProcessingError>;

    /// `Skipped` when the key lies outside the source tier.
    fn skip_outside_tier(&self, location: &ObjectLocation) -> Option<StageOutcome> {
        if is_under_prefix(&location.key, self.source_prefix()) {
            return None;
        }
        info!(
            stage = self.name(),
            bucket = %location.bucket,
            key = %location.key,
            "key outside source tier; skipping"
        );
        Some(StageOutcome::Skipped {
            key: location.key.clone(),
            reason: self.skip_message().to_string(),
        })
    }

    /// Logs a failed run before handing the result back.
    fn report(
        &self,
        location: &ObjectLocation,
        result: Result<StageOutcome, ProcessingError>,
    ) -> Result<StageOutcome, ProcessingError> {
        if let Err(err) = &result {
            error!(
                stage = self.name(),
                bucket = %location.bucket,
                key = %location.key,
                error = %err,
                "stage failed"
            );
        }
        result
    }

    async fn process(&self, location: &ObjectLocation) -> Result<StageOutcome, ProcessingError> {
        if let Some(skipped) = self.skip_outside_tier(location) {
            return Ok(skipped);
        }
        let result = self.execute(location).await;
        self.report(location, result)
    }

    /// Full invocation: resolve the trigger payload, then `process`.
    async fn handle(&self, payload: &Value) -> Result<StageOutcome, ProcessingError> {
        let event = TriggerEvent::from_value(payload);
        self.handle_event(event).await
    }

    /// `handle` for a raw payload; bytes that are not JSON are a malformed event.
    async fn handle_slice(&self, bytes: &[u8]) -> Result<StageOutcome, ProcessingError> {
        let event = TriggerEvent::from_slice(bytes);
        self.handle_event(event).await
    }

    async fn handle_event(
        &self,
        event: Result<TriggerEvent, ProcessingError>,
    ) -> Result<StageOutcome, ProcessingError> {
        let location = event.and_then(|event| event.resolve()).map_err(|err| {
            error!(stage = self.name(), error = %err, "could not resolve trigger payload");
            err
        })?;
        info!(
            stage = self.name(),
            bucket = %location.bucket,
            key = %location.key,
            "received event"
        );
        self.process(&location).await
    }
}

pub(crate) async fn fetch_table(
    store: &dyn BucketStore,
    location: &ObjectLocation,
) -> Result<DataFrame, ProcessingError> {
    let bytes = store
        .get_object(&location.bucket, &location.key)
        .await
        .map_err(|source| ProcessingError::storage(&location.bucket, &location.key, source))?;
    read_csv(&bytes).map_err(|source| ProcessingError::Parse {
        key: location.key.clone(),
        source,
    })
}

pub(crate) async fn put_table(
    store: &dyn BucketStore,
    bucket: &str,
    key: &str,
    df: &DataFrame,
) -> Result<(), ProcessingError> {
    let bytes = write_csv(df)?;
    store
        .put_object(bucket, key, Bytes::from(bytes), CSV_CONTENT_TYPE)
        .await
        .map_err(|source| ProcessingError::storage(bucket, key, source))?;
    info!(bucket, key, rows = df.height(), "wrote object");
    Ok(())
}

use medallion_bucket::BucketError;
use thiserror::Error;

use crate::table::TableError;

/// Failures that abort an invocation. Skips are not errors; see `StageOutcome::Skipped`.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("malformed trigger event: {0}")]
    MalformedEvent(String),

    #[error("storage error for s3://{bucket}/{key}: {source}")]
    Storage {
        bucket: String,
        key: String,
        #[source]
        source: BucketError,
    },

    #[error("could not parse {key} as CSV: {source}")]
    Parse {
        key: String,
        #[source]
        source: TableError,
    },

    #[error("transform failed: {0}")]
    Transform(String),
}

impl ProcessingError {
    pub(crate) fn storage(bucket: &str, key: &str, source: BucketError) -> Self {
        Self::Storage {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        }
    }
}

impl From<TableError> for ProcessingError {
    fn from(err: TableError) -> Self {
        ProcessingError::Transform(err.to_string())
    }
}

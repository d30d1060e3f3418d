//! Abstractions over the object storage that holds every pipeline tier.
//!
//! A single store handle serves every bucket: the bucket is named on each call
//! because stages learn it from the trigger payload.

mod local;
mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub use local::LocalBucketStore;
pub use memory::{MemoryBucketStore, StoredObject};
pub use s3::{S3BucketStore, S3Config};

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("sdk error: {0}")]
    Sdk(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BucketError {
    fn from_sdk(err: impl fmt::Display) -> Self {
        Self::Sdk(err.to_string())
    }
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Every key in `bucket` that starts with `prefix`, sorted lexicographically.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BucketError>;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError>;
    /// Replaces the whole object; there are no partial writes.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError>;
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BucketError>;
}

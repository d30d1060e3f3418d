use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{BucketError, BucketStore};

/// Filesystem-backed store: `<root>/<bucket>/<key>`.
///
/// Content types are not persisted.
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, BucketError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, BucketError> {
        validate_segment(bucket)?;
        if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
            return Err(BucketError::InvalidKey(key.to_string()));
        }
        let relative = Path::new(key);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(BucketError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

fn validate_segment(bucket: &str) -> Result<(), BucketError> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(BucketError::Configuration(format!(
            "invalid bucket name '{bucket}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl BucketStore for LocalBucketStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BucketError> {
        validate_segment(bucket)?;
        let bucket_root = self.root.join(bucket);
        if !tokio::fs::try_exists(&bucket_root).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![(bucket_root, String::new())];
        while let Some((dir, relative)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = if relative.is_empty() {
                    name
                } else {
                    format!("{relative}/{name}")
                };
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        debug!(bucket, prefix, count = keys.len(), "listed local objects");
        keys.sort();
        Ok(keys)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BucketError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), BucketError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BucketError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

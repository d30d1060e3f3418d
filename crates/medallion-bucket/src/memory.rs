use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{BucketError, BucketStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Process-local store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBucketStore {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
    failing_prefixes: RwLock<Vec<String>>,
    puts: RwLock<usize>,
}

impl MemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All keys currently held for `bucket`, in order.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Number of successful `put_object` calls since creation.
    pub async fn put_count(&self) -> usize {
        *self.puts.read().await
    }

    /// Make every later write under `prefix` fail with an SDK error.
    pub async fn fail_puts_under(&self, prefix: impl Into<String>) {
        self.failing_prefixes.write().await.push(prefix.into());
    }
}

#[async_trait]
impl BucketStore for MemoryBucketStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, BucketError> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BucketError> {
        self.object(bucket, key)
            .await
            .map(|object| object.bytes)
            .ok_or_else(|| BucketError::NotFound(key.to_string()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), BucketError> {
        if self
            .failing_prefixes
            .read()
            .await
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return Err(BucketError::Sdk(format!("injected write failure for {key}")));
        }

        self.objects.write().await.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        *self.puts.write().await += 1;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BucketError> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_lists_by_prefix() {
        let store = MemoryBucketStore::new();
        store
            .put_object("b", "gold/latest/a_latest.csv", Bytes::from_static(b"x"), "text/csv")
            .await
            .unwrap();
        store
            .put_object("b", "gold/latest/a_latest.csv", Bytes::from_static(b"y"), "text/csv")
            .await
            .unwrap();
        store
            .put_object("b", "silver/a.csv", Bytes::from_static(b"z"), "text/csv")
            .await
            .unwrap();

        let listed = store.list_objects("b", "gold/latest/").await.unwrap();
        assert_eq!(listed, vec!["gold/latest/a_latest.csv".to_string()]);
        assert_eq!(
            store.get_object("b", "gold/latest/a_latest.csv").await.unwrap(),
            Bytes::from_static(b"y")
        );
        assert_eq!(store.put_count().await, 3);
    }

    #[tokio::test]
    async fn buckets_are_isolated() {
        let store = MemoryBucketStore::new();
        store
            .put_object("one", "k.csv", Bytes::from_static(b"1"), "text/csv")
            .await
            .unwrap();

        assert!(matches!(
            store.get_object("two", "k.csv").await,
            Err(BucketError::NotFound(_))
        ));
        assert!(store.list_objects("two", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_only_hit_matching_prefix() {
        let store = MemoryBucketStore::new();
        store.fail_puts_under("gold/metrics/").await;

        let failed = store
            .put_object("b", "gold/metrics/m.csv", Bytes::new(), "text/csv")
            .await;
        assert!(matches!(failed, Err(BucketError::Sdk(_))));

        store
            .put_object("b", "gold/latest/m.csv", Bytes::new(), "text/csv")
            .await
            .unwrap();
        assert_eq!(store.keys("b").await, vec!["gold/latest/m.csv".to_string()]);
    }
}

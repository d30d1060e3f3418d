use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use medallion_bucket::{BucketError, BucketStore};
use medallion_processing::table::{read_csv, TableError};
use polars::prelude::DataFrame;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("storage error for {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: BucketError,
    },
    #[error("could not parse {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: TableError,
    },
    #[error("{0} is not a latest snapshot")]
    UnknownKey(String),
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub key: String,
    pub frame: DataFrame,
}

impl Snapshot {
    pub fn rows(&self) -> usize {
        self.frame.height()
    }

    pub fn columns(&self) -> usize {
        self.frame.width()
    }
}

#[derive(Debug, Clone)]
pub enum DashboardView {
    /// Nothing has been published under the latest prefix yet.
    Empty { prefix: String },
    Ready { keys: Vec<String>, snapshot: Snapshot },
}

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

/// Lists and loads latest snapshots, caching both for at most `ttl`.
pub struct DashboardReader {
    store: Arc<dyn BucketStore>,
    bucket: String,
    prefix: String,
    ttl: Duration,
    listing: Mutex<Option<Cached<Vec<String>>>>,
    tables: Mutex<HashMap<String, Cached<DataFrame>>>,
}

impl DashboardReader {
    pub fn new(
        store: Arc<dyn BucketStore>,
        bucket: impl Into<String>,
        latest_prefix: &str,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: latest_prefix.trim_matches('/').to_string(),
            ttl,
            listing: Mutex::new(None),
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// `.csv` keys under the latest prefix, sorted.
    pub async fn latest_keys(&self) -> Result<Vec<String>, DashboardError> {
        let mut listing = self.listing.lock().await;
        if let Some(keys) = listing.as_ref().and_then(|cached| cached.fresh(self.ttl)) {
            return Ok(keys);
        }

        let list_prefix = format!("{}/", self.prefix);
        let mut keys: Vec<String> = self
            .store
            .list_objects(&self.bucket, &list_prefix)
            .await
            .map_err(|source| DashboardError::Storage {
                key: list_prefix.clone(),
                source,
            })?
            .into_iter()
            .filter(|key| key.ends_with(".csv"))
            .collect();
        keys.sort();

        debug!(bucket = %self.bucket, prefix = %list_prefix, count = keys.len(), "refreshed listing");
        // Snapshots that left the listing are never served again.
        self.tables
            .lock()
            .await
            .retain(|key, _| keys.binary_search(key).is_ok());
        *listing = Some(Cached::new(keys.clone()));
        Ok(keys)
    }

    pub async fn load(&self, key: &str) -> Result<Snapshot, DashboardError> {
        let mut tables = self.tables.lock().await;
        if let Some(frame) = tables.get(key).and_then(|cached| cached.fresh(self.ttl)) {
            return Ok(Snapshot {
                key: key.to_string(),
                frame,
            });
        }

        let bytes = self
            .store
            .get_object(&self.bucket, key)
            .await
            .map_err(|source| DashboardError::Storage {
                key: key.to_string(),
                source,
            })?;
        let frame = read_csv(&bytes).map_err(|source| DashboardError::Parse {
            key: key.to_string(),
            source,
        })?;

        debug!(bucket = %self.bucket, key, rows = frame.height(), "loaded snapshot");
        tables.insert(key.to_string(), Cached::new(frame.clone()));
        Ok(Snapshot {
            key: key.to_string(),
            frame,
        })
    }

    /// The view for `selected`, or for the first key when nothing is selected.
    pub async fn view(&self, selected: Option<&str>) -> Result<DashboardView, DashboardError> {
        let keys = self.latest_keys().await?;
        let Some(first) = keys.first() else {
            return Ok(DashboardView::Empty {
                prefix: self.prefix.clone(),
            });
        };

        let key = match selected {
            Some(wanted) if keys.iter().any(|key| key == wanted) => wanted.to_string(),
            Some(wanted) => return Err(DashboardError::UnknownKey(wanted.to_string())),
            None => first.clone(),
        };

        let snapshot = self.load(&key).await?;
        Ok(DashboardView::Ready { keys, snapshot })
    }

    pub async fn invalidate(&self) {
        *self.listing.lock().await = None;
        self.tables.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use medallion_bucket::MemoryBucketStore;

    use super::*;

    const BUCKET: &str = "demo";
    const TTL: Duration = Duration::from_secs(30);

    async fn put(store: &MemoryBucketStore, key: &str) {
        store
            .put_object(BUCKET, key, Bytes::from_static(b"a\n1\n"), "text/csv")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn refreshed_listing_drops_vanished_snapshots() {
        let store = Arc::new(MemoryBucketStore::new());
        put(&store, "gold/latest/a_latest.csv").await;
        put(&store, "gold/latest/b_latest.csv").await;
        let reader = DashboardReader::new(store.clone(), BUCKET, "gold/latest", TTL);

        reader.view(Some("gold/latest/a_latest.csv")).await.unwrap();
        reader.view(Some("gold/latest/b_latest.csv")).await.unwrap();
        assert_eq!(reader.tables.lock().await.len(), 2);

        store.delete_object(BUCKET, "gold/latest/a_latest.csv").await.unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        let keys = reader.latest_keys().await.unwrap();
        assert_eq!(keys, vec!["gold/latest/b_latest.csv".to_string()]);
        let tables = reader.tables.lock().await;
        assert_eq!(tables.len(), 1);
        assert!(tables.contains_key("gold/latest/b_latest.csv"));
    }
}

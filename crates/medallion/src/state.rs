use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use medallion_bucket::{BucketStore, LocalBucketStore, S3BucketStore};
use medallion_dashboard::DashboardReader;
use medallion_processing::{BronzeToSilver, PipelineConfig, SilverToGold};
use tracing::info;

/// Everything an invocation needs, built once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub bronze_to_silver: BronzeToSilver,
    pub silver_to_gold: SilverToGold,
    pub dashboard: Arc<DashboardReader>,
}

impl AppState {
    pub fn new(config: PipelineConfig, store: Arc<dyn BucketStore>) -> Self {
        let config = Arc::new(config);
        let dashboard = DashboardReader::new(
            store.clone(),
            config.bucket.clone(),
            &config.gold_latest_prefix,
            config.dashboard_cache_ttl,
        );
        Self {
            bronze_to_silver: BronzeToSilver::new(store.clone(), config.clone()),
            silver_to_gold: SilverToGold::new(store, config.clone()),
            dashboard: Arc::new(dashboard),
            config,
        }
    }
}

pub async fn connect_store(
    config: &PipelineConfig,
    local_root: Option<PathBuf>,
) -> Result<Arc<dyn BucketStore>> {
    match local_root {
        Some(root) => {
            info!(root = %root.display(), "using local filesystem store");
            let store = LocalBucketStore::new(root)
                .await
                .context("failed to prepare local store root")?;
            Ok(Arc::new(store))
        }
        None => {
            info!(region = %config.storage.region, "using S3 store");
            let store = S3BucketStore::new(config.storage.clone())
                .await
                .context("failed to configure S3 client")?;
            Ok(Arc::new(store))
        }
    }
}

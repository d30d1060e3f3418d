use std::time::Duration;

use medallion_bucket::S3Config;
use thiserror::Error;

pub const DEFAULT_BUCKET: &str = "sports-demo-dev-sport-data";
pub const DEFAULT_REGION: &str = "eu-north-1";
pub const DEFAULT_BRONZE_PREFIX: &str = "bronze";
pub const DEFAULT_SILVER_PREFIX: &str = "silver";
pub const DEFAULT_GOLD_PREDICTIONS_PREFIX: &str = "gold/predictions";
pub const DEFAULT_GOLD_METRICS_PREFIX: &str = "gold/metrics";
pub const DEFAULT_GOLD_LATEST_PREFIX: &str = "gold/latest";
pub const DEFAULT_DASHBOARD_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got '{value}'")]
    InvalidDuration { name: &'static str, value: String },
    #[error("{name} must be true/false/1/0, got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

/// Process-wide settings, resolved once at start-up and handed to each stage.
///
/// Prefixes are stored without leading or trailing slashes.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub bucket: String,
    pub bronze_prefix: String,
    pub silver_prefix: String,
    pub gold_predictions_prefix: String,
    pub gold_metrics_prefix: String,
    pub gold_latest_prefix: String,
    pub storage: S3Config,
    pub dashboard_cache_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            bronze_prefix: DEFAULT_BRONZE_PREFIX.to_string(),
            silver_prefix: DEFAULT_SILVER_PREFIX.to_string(),
            gold_predictions_prefix: DEFAULT_GOLD_PREDICTIONS_PREFIX.to_string(),
            gold_metrics_prefix: DEFAULT_GOLD_METRICS_PREFIX.to_string(),
            gold_latest_prefix: DEFAULT_GOLD_LATEST_PREFIX.to_string(),
            storage: S3Config {
                region: DEFAULT_REGION.to_string(),
                ..S3Config::default()
            },
            dashboard_cache_ttl: DEFAULT_DASHBOARD_CACHE_TTL,
        }
    }
}

impl PipelineConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let prefix = |name: &str, default: &str| {
            value(name)
                .map(|raw| normalize_prefix(&raw))
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let force_path_style = match value("S3_FORCE_PATH_STYLE") {
            None => false,
            Some(raw) => parse_flag("S3_FORCE_PATH_STYLE", &raw)?,
        };

        let dashboard_cache_ttl = match value("DASHBOARD_CACHE_TTL_SECS") {
            None => DEFAULT_DASHBOARD_CACHE_TTL,
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidDuration {
                    name: "DASHBOARD_CACHE_TTL_SECS",
                    value: raw.clone(),
                })?,
        };

        Ok(Self {
            bucket: value("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            bronze_prefix: prefix("BRONZE_PREFIX", DEFAULT_BRONZE_PREFIX),
            silver_prefix: prefix("SILVER_PREFIX", DEFAULT_SILVER_PREFIX),
            gold_predictions_prefix: prefix(
                "GOLD_PREDICTIONS_PREFIX",
                DEFAULT_GOLD_PREDICTIONS_PREFIX,
            ),
            gold_metrics_prefix: prefix("GOLD_METRICS_PREFIX", DEFAULT_GOLD_METRICS_PREFIX),
            gold_latest_prefix: prefix("GOLD_LATEST_PREFIX", DEFAULT_GOLD_LATEST_PREFIX),
            storage: S3Config {
                region: value("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint: value("S3_ENDPOINT_URL"),
                access_key_id: value("S3_ACCESS_KEY_ID"),
                secret_access_key: value("S3_SECRET_ACCESS_KEY"),
                force_path_style,
            },
            dashboard_cache_ttl,
        })
    }
}

fn normalize_prefix(raw: &str) -> String {
    raw.trim().trim_matches('/').to_string()
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = PipelineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.bronze_prefix, "bronze");
        assert_eq!(config.gold_latest_prefix, "gold/latest");
        assert_eq!(config.storage.region, "eu-north-1");
    }

    #[test]
    fn overrides_are_trimmed_of_slashes() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("S3_BUCKET", "my-bucket"),
            ("BRONZE_PREFIX", "/raw/"),
            ("GOLD_LATEST_PREFIX", "gold/current/"),
            ("AWS_REGION", "us-west-2"),
            ("S3_FORCE_PATH_STYLE", "true"),
            ("DASHBOARD_CACHE_TTL_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.bronze_prefix, "raw");
        assert_eq!(config.gold_latest_prefix, "gold/current");
        assert_eq!(config.storage.region, "us-west-2");
        assert!(config.storage.force_path_style);
        assert_eq!(config.dashboard_cache_ttl, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config =
            PipelineConfig::from_lookup(lookup(&[("SILVER_PREFIX", "  "), ("S3_BUCKET", "")]))
                .unwrap();
        assert_eq!(config.silver_prefix, "silver");
        assert_eq!(config.bucket, DEFAULT_BUCKET);
    }

    #[test]
    fn malformed_numbers_and_flags_are_rejected() {
        let ttl = PipelineConfig::from_lookup(lookup(&[("DASHBOARD_CACHE_TTL_SECS", "soon")]));
        assert!(matches!(ttl, Err(ConfigError::InvalidDuration { .. })));

        let flag = PipelineConfig::from_lookup(lookup(&[("S3_FORCE_PATH_STYLE", "maybe")]));
        assert!(matches!(flag, Err(ConfigError::InvalidFlag { .. })));
    }
}

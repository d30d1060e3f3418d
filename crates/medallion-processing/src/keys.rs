//! Tier gating and the naming rules for derived objects.

use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;

pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const CSV_SUFFIX: &str = ".csv";

/// True when `key` sits under the `prefix/` directory.
pub fn is_under_prefix(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Swaps the first `from/` occurrence for `to/`; the rest of the key is untouched.
pub fn retier_key(key: &str, from: &str, to: &str) -> String {
    key.replacen(&format!("{from}/"), &format!("{to}/"), 1)
}

/// Final path segment without its `.csv` suffix.
pub fn base_name(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name.strip_suffix(CSV_SUFFIX).unwrap_or(file_name)
}

pub fn run_timestamp(now: DateTime<Utc>) -> String {
    now.format(RUN_TIMESTAMP_FORMAT).to_string()
}

pub fn latest_key(latest_prefix: &str, base_name: &str) -> String {
    format!("{latest_prefix}/{base_name}_latest{CSV_SUFFIX}")
}

/// The three objects one silver → gold run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldKeys {
    pub predictions: String,
    pub metrics: String,
    pub latest: String,
}

impl GoldKeys {
    pub fn new(config: &PipelineConfig, base_name: &str, timestamp: &str) -> Self {
        Self {
            predictions: format!(
                "{}/{base_name}_predictions_{timestamp}{CSV_SUFFIX}",
                config.gold_predictions_prefix
            ),
            metrics: format!(
                "{}/{base_name}_metrics_{timestamp}{CSV_SUFFIX}",
                config.gold_metrics_prefix
            ),
            latest: latest_key(&config.gold_latest_prefix, base_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn gate_requires_a_directory_boundary() {
        assert!(is_under_prefix("bronze/teams/roster.csv", "bronze"));
        assert!(is_under_prefix("gold/latest/x.csv", "gold/latest"));
        assert!(!is_under_prefix("bronzeage/roster.csv", "bronze"));
        assert!(!is_under_prefix("silver/bronze/roster.csv", "bronze"));
        assert!(!is_under_prefix("bronze", "bronze"));
    }

    #[test]
    fn retier_swaps_only_the_first_occurrence() {
        assert_eq!(
            retier_key("bronze/teams/roster.csv", "bronze", "silver"),
            "silver/teams/roster.csv"
        );
        assert_eq!(
            retier_key("bronze/archive/bronze/x.csv", "bronze", "silver"),
            "silver/archive/bronze/x.csv"
        );
        assert_eq!(
            retier_key("bronze/Deep Path/with spaces/a b.csv", "bronze", "silver"),
            "silver/Deep Path/with spaces/a b.csv"
        );
    }

    #[test]
    fn base_name_drops_folders_and_suffix() {
        assert_eq!(base_name("silver/teams/roster.csv"), "roster");
        assert_eq!(base_name("roster.csv"), "roster");
        assert_eq!(base_name("silver/teams/roster.tsv"), "roster.tsv");
        assert_eq!(base_name("silver/a/my.csv.backup.csv"), "my.csv.backup");
    }

    #[test]
    fn timestamp_is_compact_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(run_timestamp(now), "20240309T070502Z");
    }

    #[test]
    fn gold_keys_follow_naming_rules() {
        let config = PipelineConfig::default();
        let keys = GoldKeys::new(&config, "roster", "20240309T070502Z");
        assert_eq!(
            keys.predictions,
            "gold/predictions/roster_predictions_20240309T070502Z.csv"
        );
        assert_eq!(keys.metrics, "gold/metrics/roster_metrics_20240309T070502Z.csv");
        assert_eq!(keys.latest, "gold/latest/roster_latest.csv");
    }

    #[test]
    fn latest_key_ignores_the_timestamp() {
        let config = PipelineConfig::default();
        let first = GoldKeys::new(&config, "roster", "20240101T000000Z");
        let second = GoldKeys::new(&config, "roster", "20250101T000000Z");
        assert_ne!(first.predictions, second.predictions);
        assert_eq!(first.latest, second.latest);
    }
}

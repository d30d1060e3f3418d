//! Bronze → silver → gold transformation stages over object storage.

pub mod config;
pub mod error;
pub mod event;
pub mod keys;
pub mod outcome;
pub mod stages;
pub mod table;

pub use config::{ConfigError, PipelineConfig};
pub use error::ProcessingError;
pub use event::{EventBridgeEvent, ObjectLocation, S3NotificationEvent, TriggerEvent};
pub use outcome::{GoldSummary, InvocationResult, SilverSummary, StageOutcome};
pub use stages::{BronzeToSilver, SilverToGold, Stage};
pub use table::TableError;

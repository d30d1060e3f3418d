//! Trigger payloads and their resolution to a single object location.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProcessingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

/// Native bucket notification: `{"Records": [{"s3": {...}}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3NotificationEvent {
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

/// Event-bus envelope: `{"detail": {"bucket": {...}, "object": {...}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBridgeEvent {
    pub detail: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    S3Notification(S3NotificationEvent),
    EventBridge(EventBridgeEvent),
}

impl S3NotificationEvent {
    /// Only the first record is processed.
    pub fn resolve(&self) -> Result<ObjectLocation, ProcessingError> {
        let record = self.records.first().ok_or_else(|| {
            ProcessingError::MalformedEvent("notification carries no records".into())
        })?;
        Ok(ObjectLocation::new(
            record.s3.bucket.name.clone(),
            record.s3.object.key.clone(),
        ))
    }
}

impl EventBridgeEvent {
    pub fn resolve(&self) -> ObjectLocation {
        ObjectLocation::new(self.detail.bucket.name.clone(), self.detail.object.key.clone())
    }
}

impl TriggerEvent {
    /// Sniffs the payload shape: a non-empty `Records` array wins, then `detail`.
    pub fn from_value(payload: &Value) -> Result<Self, ProcessingError> {
        let has_records = payload
            .get("Records")
            .and_then(Value::as_array)
            .is_some_and(|records| !records.is_empty());

        if has_records {
            return serde_json::from_value(payload.clone())
                .map(TriggerEvent::S3Notification)
                .map_err(|err| {
                    ProcessingError::MalformedEvent(format!("invalid notification record: {err}"))
                });
        }

        if payload.get("detail").is_some_and(|detail| !detail.is_null()) {
            return serde_json::from_value(payload.clone())
                .map(TriggerEvent::EventBridge)
                .map_err(|err| {
                    ProcessingError::MalformedEvent(format!("invalid event detail: {err}"))
                });
        }

        Err(ProcessingError::MalformedEvent(
            "unsupported event format: missing 'Records' and 'detail'".into(),
        ))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProcessingError> {
        let payload: Value = serde_json::from_slice(bytes)
            .map_err(|err| ProcessingError::MalformedEvent(format!("payload is not JSON: {err}")))?;
        Self::from_value(&payload)
    }

    pub fn resolve(&self) -> Result<ObjectLocation, ProcessingError> {
        match self {
            TriggerEvent::S3Notification(event) => event.resolve(),
            TriggerEvent::EventBridge(event) => Ok(event.resolve()),
        }
    }
}

/// Parses and resolves in one step.
pub fn resolve_location(payload: &Value) -> Result<ObjectLocation, ProcessingError> {
    TriggerEvent::from_value(payload)?.resolve()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resolves_native_notification() {
        let payload = json!({
            "Records": [
                {"eventName": "ObjectCreated:Put", "s3": {"bucket": {"name": "demo"}, "object": {"key": "bronze/teams/roster.csv", "size": 42}}},
                {"s3": {"bucket": {"name": "other"}, "object": {"key": "bronze/ignored.csv"}}}
            ]
        });

        let event = TriggerEvent::from_value(&payload).unwrap();
        assert!(matches!(event, TriggerEvent::S3Notification(_)));
        assert_eq!(
            event.resolve().unwrap(),
            ObjectLocation::new("demo", "bronze/teams/roster.csv")
        );
    }

    #[test]
    fn resolves_event_bus_envelope() {
        let payload = json!({
            "source": "aws.s3",
            "detail-type": "Object Created",
            "detail": {"bucket": {"name": "demo"}, "object": {"key": "silver/teams/roster.csv", "etag": "x"}}
        });

        let event = TriggerEvent::from_value(&payload).unwrap();
        assert!(matches!(event, TriggerEvent::EventBridge(_)));
        assert_eq!(
            event.resolve().unwrap(),
            ObjectLocation::new("demo", "silver/teams/roster.csv")
        );
    }

    #[test]
    fn empty_records_fall_through_to_detail() {
        let payload = json!({
            "Records": [],
            "detail": {"bucket": {"name": "demo"}, "object": {"key": "bronze/a.csv"}}
        });
        assert_eq!(
            resolve_location(&payload).unwrap(),
            ObjectLocation::new("demo", "bronze/a.csv")
        );
    }

    #[test]
    fn keys_are_returned_verbatim() {
        let payload = json!({
            "Records": [{"s3": {"bucket": {"name": "demo"}, "object": {"key": "bronze/my+file%20x.csv"}}}]
        });
        assert_eq!(resolve_location(&payload).unwrap().key, "bronze/my+file%20x.csv");
    }

    #[test]
    fn unrecognized_shapes_are_malformed() {
        for payload in [
            json!({}),
            json!({"Records": []}),
            json!({"detail": null}),
            json!({"Records": [{"s3": {"bucket": {}}}]}),
            json!({"detail": {"bucket": {"name": "demo"}}}),
            json!([1, 2, 3]),
        ] {
            assert!(
                matches!(resolve_location(&payload), Err(ProcessingError::MalformedEvent(_))),
                "payload {payload} should be rejected"
            );
        }
    }

    #[test]
    fn non_json_bytes_are_malformed() {
        assert!(matches!(
            TriggerEvent::from_slice(b"not json"),
            Err(ProcessingError::MalformedEvent(_))
        ));
    }
}

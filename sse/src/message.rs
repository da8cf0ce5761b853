use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of notifications carried by a snapshot frame.
pub const SNAPSHOT_LIMIT: usize = 20;

/// Trait for getting the envelope type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Full current-state payload of `initial` and `update` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Newest first, never more than `SNAPSHOT_LIMIT` entries.
    pub notifications: Vec<Value>,
    pub unread_count: u64,
}

impl Snapshot {
    pub fn new(mut notifications: Vec<Value>, unread_count: u64) -> Self {
        notifications.truncate(SNAPSHOT_LIMIT);
        Self {
            notifications,
            unread_count,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

/// Tagged message pushed over a notification stream.
///
/// Serializes as `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Envelope {
    Initial(Snapshot),
    Update(Snapshot),
    NewNotification(Value),
    Heartbeat { timestamp: DateTime<Utc> },
}

impl Envelope {
    pub fn heartbeat() -> Self {
        Envelope::Heartbeat {
            timestamp: Utc::now(),
        }
    }
}

impl EventType for Envelope {
    fn event_type(&self) -> &'static str {
        match self {
            Envelope::Initial(_) => "initial",
            Envelope::Update(_) => "update",
            Envelope::NewNotification(_) => "new_notification",
            Envelope::Heartbeat { .. } => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_envelope_uses_type_and_camel_case_payload() {
        let envelope = Envelope::Initial(Snapshot::new(vec![json!({"id": "a"})], 1));

        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "initial",
                "payload": {"notifications": [{"id": "a"}], "unreadCount": 1}
            })
        );
    }

    #[test]
    fn new_notification_payload_is_the_record_itself() {
        let record = json!({"id": "n1", "title": "Feedback received"});
        let value = serde_json::to_value(Envelope::NewNotification(record.clone())).unwrap();

        assert_eq!(value["type"], "new_notification");
        assert_eq!(value["payload"], record);
    }

    #[test]
    fn heartbeat_carries_only_a_timestamp() {
        let value = serde_json::to_value(Envelope::heartbeat()).unwrap();

        assert_eq!(value["type"], "heartbeat");
        let payload = value["payload"].as_object().unwrap();
        assert_eq!(payload.len(), 1);
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn snapshot_is_truncated_to_the_limit() {
        let notifications = (0..25).map(|i| json!({ "id": i })).collect();
        let snapshot = Snapshot::new(notifications, 25);

        assert_eq!(snapshot.notifications.len(), SNAPSHOT_LIMIT);
        assert_eq!(snapshot.notifications[0], json!({"id": 0}));
        assert_eq!(snapshot.unread_count, 25);
    }

    #[test]
    fn event_type_matches_the_serialized_tag() {
        let envelopes = [
            Envelope::Initial(Snapshot::empty()),
            Envelope::Update(Snapshot::empty()),
            Envelope::NewNotification(json!({})),
            Envelope::heartbeat(),
        ];
        for envelope in envelopes {
            let value = serde_json::to_value(&envelope).unwrap();
            assert_eq!(value["type"], envelope.event_type());
        }
    }
}

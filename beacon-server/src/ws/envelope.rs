use anyhow::Result;
use axum::extract::ws::{Message, Utf8Bytes};
use beacon_core::relay::channels;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event tag for worker-produced targeted notifications.
pub const WORKER_NOTIFICATION: &str = "worker.notification";

/// Outbound message shape shared by both WebSocket surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Serialize into a WebSocket text frame.
    pub fn to_message(&self) -> Result<Message> {
        let json = serde_json::to_string(self)?;
        Ok(Message::Text(Utf8Bytes::from(json)))
    }
}

/// Map a relay channel onto the event tag dashboards see.
pub fn tag_for_channel(channel: &str) -> Option<&'static str> {
    match channel {
        channels::URGENT_EVENT => Some("incident.alert"),
        channels::NORMAL_EVENT => Some("resource.request"),
        channels::STATUS_EVENT => Some("status.update"),
        channels::TARGETED_NOTIFICATION => Some(WORKER_NOTIFICATION),
        _ => None,
    }
}

/// The single inbound frame the targeted endpoint understands.
///
/// Anything that fails to parse as this is silently dropped and the
/// connection stays open.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InboundFrame {
    #[serde(rename_all = "camelCase")]
    Register { user_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_event_and_data() {
        let envelope = Envelope::new("incident.alert", json!({"severity": "high"}));
        let message = envelope.to_message().unwrap();

        let Message::Text(text) = message else {
            panic!("expected a text frame");
        };
        let value: Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value["event"], "incident.alert");
        assert_eq!(value["data"]["severity"], "high");
    }

    #[test]
    fn registration_frame_parses_the_wire_shape() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"action":"register","userId":"u42"}"#).unwrap();
        let InboundFrame::Register { user_id } = frame;
        assert_eq!(user_id, "u42");
    }

    #[test]
    fn junk_frames_do_not_parse() {
        assert!(serde_json::from_str::<InboundFrame>("not json").is_err());
        assert!(serde_json::from_str::<InboundFrame>(r#"{"action":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<InboundFrame>(r#"{"action":"register"}"#).is_err());
    }

    #[test]
    fn every_pipeline_channel_has_a_tag() {
        for channel in [
            channels::URGENT_EVENT,
            channels::NORMAL_EVENT,
            channels::STATUS_EVENT,
            channels::TARGETED_NOTIFICATION,
        ] {
            assert!(tag_for_channel(channel).is_some());
        }
        assert!(tag_for_channel("unrelated").is_none());
    }
}

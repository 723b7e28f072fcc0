//! Vendor wire frames.
//!
//! JSON-object frames exchanged with the telephony media stream. Inbound
//! frames carry an `event` discriminator plus event-specific fields;
//! outbound frames are the three shapes the vendor accepts for
//! model-originated output.

use serde::{Deserialize, Serialize};

/// Marker name sent with every turn-completed `mark` frame.
pub const RESPONSE_PART_MARK: &str = "responsePart";

// =============================================================================
// Inbound frames (vendor -> hub)
// =============================================================================

/// Envelope common to every inbound frame.
#[derive(Debug, Deserialize)]
pub struct StreamEventFrame {
    /// connected, start, media, stop
    #[serde(default)]
    pub event: String,

    #[serde(rename = "sequenceNumber", default)]
    pub sequence_number: Option<String>,

    #[serde(rename = "streamSid", default)]
    pub stream_sid: Option<String>,
}

/// Full shape of a `start` frame.
#[derive(Debug, Deserialize)]
pub struct StreamStartFrame {
    #[serde(rename = "start")]
    pub body: StreamStartBody,
}

/// Nested body of a `start` frame.
#[derive(Debug, Deserialize)]
pub struct StreamStartBody {
    #[serde(rename = "accountSid", default)]
    pub account_sid: Option<String>,

    /// Call identity the stream is bound to for its lifetime.
    #[serde(rename = "callSid")]
    pub call_sid: String,

    #[serde(default)]
    pub tracks: Vec<String>,

    /// Opaque caller-supplied parameters, forwarded verbatim.
    #[serde(rename = "customParameters", default)]
    pub custom_parameters: serde_json::Value,
}

/// Full shape of a `media` frame.
#[derive(Debug, Deserialize)]
pub struct StreamMediaFrame {
    pub media: StreamMediaBody,
}

/// Nested body of a `media` frame.
#[derive(Debug, Deserialize)]
pub struct StreamMediaBody {
    #[serde(default)]
    pub track: Option<String>,

    #[serde(default)]
    pub chunk: Option<String>,

    #[serde(default)]
    pub timestamp: Option<String>,

    /// Base64 media payload, forwarded verbatim.
    pub payload: String,
}

// =============================================================================
// Outbound frames (hub -> vendor)
// =============================================================================

/// Frames written back to the vendor transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// A chunk of model output audio.
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMediaBody,
    },

    /// Model turn/response completed.
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: OutboundMarkBody,
    },

    /// Model detected a user interruption; the vendor flushes buffered audio.
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Payload body of an outbound `media` frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMediaBody {
    pub payload: String,
}

/// Marker body of an outbound `mark` frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMarkBody {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_deserializes_minimal_frame() {
        let frame: StreamEventFrame = serde_json::from_str(r#"{"event": "stop"}"#).unwrap();
        assert_eq!(frame.event, "stop");
        assert!(frame.stream_sid.is_none());
        assert!(frame.sequence_number.is_none());
    }

    #[test]
    fn test_start_frame_deserialization() {
        let text = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "streamSid": "MZ123",
            "start": {
                "accountSid": "AC999",
                "callSid": "CA456",
                "tracks": ["inbound"],
                "customParameters": {"conversation_id": "conv-1"}
            }
        }"#;

        let frame: StreamStartFrame = serde_json::from_str(text).unwrap();
        assert_eq!(frame.body.call_sid, "CA456");
        assert_eq!(frame.body.account_sid.as_deref(), Some("AC999"));
        assert_eq!(frame.body.tracks, vec!["inbound"]);
        assert_eq!(
            frame.body.custom_parameters,
            json!({"conversation_id": "conv-1"})
        );
    }

    #[test]
    fn test_media_frame_deserialization() {
        let text = r#"{
            "event": "media",
            "streamSid": "MZ123",
            "media": {"track": "inbound", "chunk": "2", "timestamp": "120", "payload": "AAAA"}
        }"#;

        let frame: StreamMediaFrame = serde_json::from_str(text).unwrap();
        assert_eq!(frame.media.payload, "AAAA");
        assert_eq!(frame.media.track.as_deref(), Some("inbound"));
    }

    #[test]
    fn test_outbound_media_serialization() {
        let frame = OutboundFrame::Media {
            stream_sid: "MZ123".to_string(),
            media: OutboundMediaBody {
                payload: "AAAA".to_string(),
            },
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({"event": "media", "streamSid": "MZ123", "media": {"payload": "AAAA"}})
        );
    }

    #[test]
    fn test_outbound_mark_serialization() {
        let frame = OutboundFrame::Mark {
            stream_sid: "MZ123".to_string(),
            mark: OutboundMarkBody {
                name: RESPONSE_PART_MARK.to_string(),
            },
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({"event": "mark", "streamSid": "MZ123", "mark": {"name": "responsePart"}})
        );
    }

    #[test]
    fn test_outbound_clear_serialization() {
        let frame = OutboundFrame::Clear {
            stream_sid: "MZ123".to_string(),
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"event": "clear", "streamSid": "MZ123"}));
    }
}

//! Vendor frame to canonical event translation.
//!
//! Decoding is a pure mapping from frame text plus connection state to a
//! canonical [`HubEvent`]; the inverse direction lives on
//! [`super::OutboundEncoder`]. A decode failure is local to the offending
//! frame — callers drop the frame and keep the session alive.

use thiserror::Error;

use super::connection::StreamConnection;
use super::event::{HubEvent, HubEventKind};
use super::frames::{StreamEventFrame, StreamMediaFrame, StreamStartFrame};

/// A frame that could not be decoded.
#[derive(Debug, Error)]
#[error("malformed stream frame: {0}")]
pub struct FrameDecodeError(String);

impl From<serde_json::Error> for FrameDecodeError {
    fn from(err: serde_json::Error) -> Self {
        FrameDecodeError(err.to_string())
    }
}

/// Decode one inbound frame, updating the connection record.
///
/// Returns `Ok(None)` when the frame carries no event discriminator; the
/// caller must not forward anything downstream for that frame. Unknown
/// discriminators are forwarded unchanged as [`HubEventKind::Other`].
pub fn decode_frame(
    text: &str,
    conn: &mut StreamConnection,
) -> Result<Option<HubEvent>, FrameDecodeError> {
    let frame: StreamEventFrame = serde_json::from_str(text)?;

    if let Some(sid) = frame.stream_sid.as_deref() {
        conn.bind_stream(sid);
    }

    let Some(kind) = HubEventKind::from_wire(&frame.event) else {
        // No event: leave the rest of the connection record untouched.
        return Ok(None);
    };
    conn.event = Some(kind.clone());

    match kind {
        HubEventKind::UserConnected => {
            let start: StreamStartFrame = serde_json::from_str(text)?;
            conn.conversation_id = Some(start.body.call_sid.clone());
            conn.data = Some(start.body.custom_parameters.to_string());
        }
        HubEventKind::UserDataReceived => {
            let media: StreamMediaFrame = serde_json::from_str(text)?;
            conn.data = Some(media.media.payload);
        }
        _ => {}
    }

    Ok(Some(HubEvent {
        kind,
        stream_sid: conn.stream_sid().unwrap_or_default().to_string(),
        conversation_id: conn.conversation_id().map(str::to_string),
        data: conn.data().map(str::to_string),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const START_FRAME: &str = r#"{
        "event": "start",
        "sequenceNumber": "1",
        "streamSid": "MZ123",
        "start": {
            "accountSid": "AC999",
            "callSid": "CA456",
            "tracks": ["inbound", "outbound"],
            "customParameters": {"conversation_id": "conv-1", "agent": "support"}
        }
    }"#;

    #[test]
    fn test_start_frame_binds_conversation_and_preserves_parameters() {
        let mut conn = StreamConnection::new();
        let event = decode_frame(START_FRAME, &mut conn).unwrap().unwrap();

        assert_eq!(event.kind, HubEventKind::UserConnected);
        assert_eq!(event.stream_sid, "MZ123");
        assert_eq!(conn.conversation_id(), Some("CA456"));

        // Custom parameters survive verbatim
        let data: serde_json::Value = serde_json::from_str(conn.data().unwrap()).unwrap();
        assert_eq!(
            data,
            json!({"conversation_id": "conv-1", "agent": "support"})
        );
    }

    #[test]
    fn test_media_frame_preserves_payload_verbatim() {
        let mut conn = StreamConnection::new();
        let text = r#"{"event": "media", "streamSid": "MZ123", "media": {"payload": "dGVzdA=="}}"#;

        let event = decode_frame(text, &mut conn).unwrap().unwrap();

        assert_eq!(event.kind, HubEventKind::UserDataReceived);
        assert_eq!(event.data.as_deref(), Some("dGVzdA=="));
        assert_eq!(conn.data(), Some("dGVzdA=="));
    }

    #[test]
    fn test_stop_frame_yields_user_disconnected() {
        let mut conn = StreamConnection::new();
        let event = decode_frame(r#"{"event": "stop", "streamSid": "MZ123"}"#, &mut conn)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, HubEventKind::UserDisconnected);
    }

    #[test]
    fn test_unknown_discriminator_forwarded_unchanged() {
        let mut conn = StreamConnection::new();
        let event = decode_frame(r#"{"event": "dtmf", "streamSid": "MZ123"}"#, &mut conn)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, HubEventKind::Other("dtmf".to_string()));
        assert_eq!(event.kind.as_str(), "dtmf");
    }

    #[test]
    fn test_empty_discriminator_is_no_event() {
        let mut conn = StreamConnection::new();
        let result = decode_frame(r#"{"streamSid": "MZ123"}"#, &mut conn).unwrap();
        assert!(result.is_none());
        // The stream identity is still recorded before the short-circuit
        assert_eq!(conn.stream_sid(), Some("MZ123"));
        assert!(conn.event().is_none());
        assert!(conn.data().is_none());
    }

    #[test]
    fn test_malformed_frame_is_an_error_not_a_panic() {
        let mut conn = StreamConnection::new();
        assert!(decode_frame("{nope", &mut conn).is_err());
        assert!(decode_frame(r#"{"event": "start", "streamSid": "MZ1"}"#, &mut conn).is_err());
    }

    #[test]
    fn test_encoder_bound_by_first_frame() {
        let mut conn = StreamConnection::new();
        decode_frame(START_FRAME, &mut conn).unwrap();

        let encoder = conn.encoder().expect("encoder bound at start");
        assert_eq!(encoder.stream_sid(), "MZ123");
    }
}

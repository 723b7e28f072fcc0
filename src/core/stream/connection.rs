//! Per-session connection state.

use super::event::HubEventKind;
use super::frames::{OutboundFrame, OutboundMarkBody, OutboundMediaBody, RESPONSE_PART_MARK};

/// Encodes model-originated events into vendor frames for one stream.
///
/// The stream identity is not known until the first inbound frame is
/// decoded, so the encoder is constructed at that moment and stored in the
/// connection record; all model output for the session is encoded through
/// it.
#[derive(Debug, Clone)]
pub struct OutboundEncoder {
    stream_sid: String,
}

impl OutboundEncoder {
    /// Bind an encoder to a stream identity.
    pub fn new(stream_sid: impl Into<String>) -> Self {
        Self {
            stream_sid: stream_sid.into(),
        }
    }

    /// The bound stream identity.
    pub fn stream_sid(&self) -> &str {
        &self.stream_sid
    }

    /// Encode a model output chunk as a `media` frame.
    pub fn model_message_frame(&self, payload: &str) -> OutboundFrame {
        OutboundFrame::Media {
            stream_sid: self.stream_sid.clone(),
            media: OutboundMediaBody {
                payload: payload.to_string(),
            },
        }
    }

    /// Encode a turn/response completion as a `mark` frame.
    pub fn response_done_frame(&self) -> OutboundFrame {
        OutboundFrame::Mark {
            stream_sid: self.stream_sid.clone(),
            mark: OutboundMarkBody {
                name: RESPONSE_PART_MARK.to_string(),
            },
        }
    }

    /// Encode a detected user interruption as a `clear` frame.
    pub fn interrupt_frame(&self) -> OutboundFrame {
        OutboundFrame::Clear {
            stream_sid: self.stream_sid.clone(),
        }
    }
}

/// Mutable per-session record for one realtime connection.
///
/// Owned by the session's read loop; inbound frames arrive strictly in
/// order from a single loop, so mutation needs no coordination. Backend
/// callbacks only read the bound encoder.
#[derive(Debug, Default)]
pub struct StreamConnection {
    pub(crate) stream_sid: Option<String>,
    pub(crate) conversation_id: Option<String>,
    pub(crate) event: Option<HubEventKind>,
    pub(crate) data: Option<String>,
    pub(crate) encoder: Option<OutboundEncoder>,
}

impl StreamConnection {
    /// Fresh connection with no stream identity yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vendor stream identity, once seen.
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    /// Conversation binding, set by the `start` frame.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Canonical kind of the most recent event.
    pub fn event(&self) -> Option<&HubEventKind> {
        self.event.as_ref()
    }

    /// Most recent opaque payload.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Outbound encoder, bound once the stream identity is known.
    pub fn encoder(&self) -> Option<&OutboundEncoder> {
        self.encoder.as_ref()
    }

    /// Record the stream identity and bind the outbound encoder on first
    /// sight. Subsequent calls update the identity but keep the original
    /// encoder binding.
    pub(crate) fn bind_stream(&mut self, stream_sid: &str) {
        self.stream_sid = Some(stream_sid.to_string());
        if self.encoder.is_none() {
            self.encoder = Some(OutboundEncoder::new(stream_sid));
        }
    }
}

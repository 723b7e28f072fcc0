//! Realtime stream bridging.
//!
//! Translates between the telephony vendor's framed JSON events and the
//! hub's canonical event model, and tracks per-session connection state.

mod connection;
mod event;
mod frames;
mod translate;

pub use connection::{OutboundEncoder, StreamConnection};
pub use event::{HubEvent, HubEventKind};
pub use frames::{
    OutboundFrame, OutboundMarkBody, OutboundMediaBody, RESPONSE_PART_MARK, StreamEventFrame,
    StreamMediaBody, StreamMediaFrame, StreamStartBody, StreamStartFrame,
};
pub use translate::{FrameDecodeError, decode_frame};

//! Telephony media stream WebSocket bridge
//!
//! Bridges the vendor's framed JSON stream protocol to a model session:
//!
//! ## Vendor → Server
//!
//! - **start**: stream identity, call binding, custom parameters
//! - **media**: base64 media payload
//! - **stop**: caller hung up
//! - anything else is forwarded to the model session unchanged
//!
//! ## Server → Vendor
//!
//! - **media**: model output chunk
//! - **mark**: model turn completed
//! - **clear**: model detected a user interruption

mod handler;

pub use handler::stream_handler;

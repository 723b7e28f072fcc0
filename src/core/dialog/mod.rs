//! Conversation turn model shared by the dispatcher and the realtime hub.

mod message;

pub use message::{AgentRole, DialogMessage};

//! Canonical hub events.
//!
//! The hub's vendor-neutral representation of a realtime occurrence. Vendor
//! discriminators the translator does not recognize are forwarded unchanged
//! as [`HubEventKind::Other`]; unknown events are not errors.

use std::fmt;

/// Kind of a canonical hub event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEventKind {
    /// The caller's media stream started.
    UserConnected,
    /// A chunk of caller media arrived.
    UserDataReceived,
    /// The caller's media stream ended.
    UserDisconnected,
    /// Unrecognized vendor discriminator, forwarded as-is.
    Other(String),
}

impl HubEventKind {
    /// Map a vendor discriminator to its canonical kind.
    ///
    /// Returns `None` for an empty tag, which callers must treat as "no
    /// event": nothing may be forwarded downstream for that frame.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "" => None,
            "start" => Some(HubEventKind::UserConnected),
            "media" => Some(HubEventKind::UserDataReceived),
            "stop" => Some(HubEventKind::UserDisconnected),
            other => Some(HubEventKind::Other(other.to_string())),
        }
    }

    /// Canonical tag string.
    pub fn as_str(&self) -> &str {
        match self {
            HubEventKind::UserConnected => "user_connected",
            HubEventKind::UserDataReceived => "user_data_received",
            HubEventKind::UserDisconnected => "user_disconnected",
            HubEventKind::Other(tag) => tag,
        }
    }
}

impl fmt::Display for HubEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical event delivered to the model-session backend.
#[derive(Debug, Clone)]
pub struct HubEvent {
    /// Event kind.
    pub kind: HubEventKind,
    /// Vendor stream identity correlating all frames of this session.
    pub stream_sid: String,
    /// Conversation the stream is bound to, once known.
    pub conversation_id: Option<String>,
    /// Event payload: the custom-parameters blob for `user_connected`,
    /// the raw media payload for `user_data_received`.
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_discriminators() {
        assert_eq!(
            HubEventKind::from_wire("start"),
            Some(HubEventKind::UserConnected)
        );
        assert_eq!(
            HubEventKind::from_wire("media"),
            Some(HubEventKind::UserDataReceived)
        );
        assert_eq!(
            HubEventKind::from_wire("stop"),
            Some(HubEventKind::UserDisconnected)
        );
    }

    #[test]
    fn test_unknown_discriminator_passes_through() {
        let kind = HubEventKind::from_wire("dtmf").expect("unknown tags are events");
        assert_eq!(kind, HubEventKind::Other("dtmf".to_string()));
        assert_eq!(kind.as_str(), "dtmf");
    }

    #[test]
    fn test_empty_tag_is_no_event() {
        assert_eq!(HubEventKind::from_wire(""), None);
    }

    #[test]
    fn test_canonical_tags() {
        assert_eq!(HubEventKind::UserConnected.to_string(), "user_connected");
        assert_eq!(
            HubEventKind::UserDataReceived.to_string(),
            "user_data_received"
        );
        assert_eq!(
            HubEventKind::UserDisconnected.to_string(),
            "user_disconnected"
        );
    }
}

//! Dialog message types.
//!
//! A [`DialogMessage`] is a single turn in a conversation. The function
//! dispatcher never executes a callback against the canonical message:
//! it clones the message, lets the callback and hooks mutate the clone,
//! and copies an enumerated subset of fields back afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Role of the author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// System/prompt turn
    System,
    /// End-user turn
    User,
    /// Model-generated turn
    Assistant,
    /// Function execution result turn
    Function,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::System => write!(f, "system"),
            AgentRole::User => write!(f, "user"),
            AgentRole::Assistant => write!(f, "assistant"),
            AgentRole::Function => write!(f, "function"),
        }
    }
}

/// A single turn in a conversation.
///
/// Owned by the conversation session. During function dispatch the message
/// is cloned; the clone is the only value visible to the callback and hooks,
/// and [`DialogMessage::apply_function_result`] merges the result back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogMessage {
    /// Author of this turn.
    pub role: AgentRole,

    /// Unique message identifier.
    pub message_id: String,

    /// Identifier of the agent currently handling the conversation.
    #[serde(default)]
    pub current_agent_id: Option<String>,

    /// Textual content of the turn.
    #[serde(default)]
    pub content: String,

    /// Rich/multimodal content attached to the turn.
    #[serde(default)]
    pub rich_content: Option<serde_json::Value>,

    /// Opaque attachment payload. Never merged back after execution.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,

    /// Structured data produced by a function execution.
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    /// Name of the function being invoked or returned.
    #[serde(default)]
    pub function_name: Option<String>,

    /// Raw JSON argument text produced by the reasoning engine.
    #[serde(default)]
    pub function_args: Option<String>,

    /// Function to post back to after this one completes.
    #[serde(default)]
    pub postback_function_name: Option<String>,

    /// Human-readable progress text shown while the function runs.
    #[serde(default)]
    pub indication: Option<String>,

    /// When set, the pipeline halts further reasoning after this turn.
    #[serde(default)]
    pub stop_completion: bool,

    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl DialogMessage {
    /// Create a new message with the given role and content.
    pub fn new(role: AgentRole, content: impl Into<String>) -> Self {
        Self {
            role,
            message_id: uuid::Uuid::new_v4().to_string(),
            current_agent_id: None,
            content: content.into(),
            rich_content: None,
            payload: None,
            data: None,
            function_name: None,
            function_args: None,
            postback_function_name: None,
            indication: None,
            stop_completion: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Copy the result of a function execution from the working clone back
    /// into this canonical message.
    ///
    /// Only the enumerated subset is copied: role (forced to
    /// [`AgentRole::Function`]), function name, current agent id, content,
    /// postback function name, stop flag, rich content, and structured data.
    /// The attachment `payload` is deliberately excluded.
    pub fn apply_function_result(&mut self, executed: &DialogMessage) {
        self.role = AgentRole::Function;
        self.function_name = executed.function_name.clone();
        self.postback_function_name = executed.postback_function_name.clone();
        self.current_agent_id = executed.current_agent_id.clone();
        self.content = executed.content.clone();
        // Don't copy payload
        self.stop_completion = executed.stop_completion;
        self.rich_content = executed.rich_content.clone();
        self.data = executed.data.clone();
    }

    /// Whether the structured data field holds a non-null value.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_display() {
        assert_eq!(AgentRole::User.to_string(), "user");
        assert_eq!(AgentRole::Function.to_string(), "function");
    }

    #[test]
    fn test_new_message_defaults() {
        let msg = DialogMessage::new(AgentRole::User, "hello");
        assert_eq!(msg.role, AgentRole::User);
        assert_eq!(msg.content, "hello");
        assert!(!msg.stop_completion);
        assert!(msg.function_name.is_none());
        assert!(!msg.message_id.is_empty());
    }

    #[test]
    fn test_apply_function_result_copies_enumerated_fields() {
        let mut canonical = DialogMessage::new(AgentRole::User, "original");
        canonical.payload = Some(json!({"kept": true}));

        let mut executed = canonical.clone();
        executed.function_name = Some("lookup_order".to_string());
        executed.current_agent_id = Some("agent-7".to_string());
        executed.content = "order found".to_string();
        executed.postback_function_name = Some("notify".to_string());
        executed.stop_completion = true;
        executed.rich_content = Some(json!({"card": "order"}));
        executed.data = Some(json!({"order_id": 42}));
        executed.payload = Some(json!({"overwritten": true}));

        canonical.apply_function_result(&executed);

        assert_eq!(canonical.role, AgentRole::Function);
        assert_eq!(canonical.function_name.as_deref(), Some("lookup_order"));
        assert_eq!(canonical.current_agent_id.as_deref(), Some("agent-7"));
        assert_eq!(canonical.content, "order found");
        assert_eq!(canonical.postback_function_name.as_deref(), Some("notify"));
        assert!(canonical.stop_completion);
        assert_eq!(canonical.rich_content, Some(json!({"card": "order"})));
        assert_eq!(canonical.data, Some(json!({"order_id": 42})));
        // Payload retains the canonical value even though the clone changed it
        assert_eq!(canonical.payload, Some(json!({"kept": true})));
    }

    #[test]
    fn test_has_data() {
        let mut msg = DialogMessage::new(AgentRole::Function, "");
        assert!(!msg.has_data());
        msg.data = Some(serde_json::Value::Null);
        assert!(!msg.has_data());
        msg.data = Some(json!([1, 2]));
        assert!(msg.has_data());
    }

    #[test]
    fn test_serde_round_trip() {
        let mut msg = DialogMessage::new(AgentRole::Assistant, "hi");
        msg.data = Some(json!({"k": "v"}));
        let text = serde_json::to_string(&msg).expect("serialize");
        let back: DialogMessage = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back.content, "hi");
        assert_eq!(back.role, AgentRole::Assistant);
        assert_eq!(back.data, Some(json!({"k": "v"})));
    }
}

//! Outbound phone call function.
//!
//! Parses the reasoning engine's arguments, validates the destination
//! number, and places the call through an [`OutboundDialer`]. The actual
//! telephony API lives behind the trait; this callback owns argument
//! handling and the conversation fork for the new call.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::{FunctionCallback, FunctionResult};
use crate::core::dialog::DialogMessage;
use crate::utils::validate_phone_number;

/// Registry name of the outbound phone call function.
pub const OUTBOUND_PHONE_CALL_FN: &str = "util-twilio-twilio_outbound_phone_call";

#[derive(Debug, Deserialize)]
struct OutboundCallArgs {
    phone_number: String,
    initial_message: String,
}

/// Call-control collaborator that places outbound calls.
#[async_trait]
pub trait OutboundDialer: Send + Sync {
    /// Dial `to` and point the media stream of the answered call at
    /// `stream_url`. Returns the vendor call identifier.
    async fn dial(&self, to: &str, stream_url: &str) -> FunctionResult<String>;
}

/// Function callback that starts an outbound phone conversation.
pub struct OutboundPhoneCallFn {
    dialer: Arc<dyn OutboundDialer>,
    callback_host: String,
}

impl OutboundPhoneCallFn {
    /// `callback_host` is the public base URL the telephony vendor connects
    /// back to for the media stream.
    pub fn new(dialer: Arc<dyn OutboundDialer>, callback_host: impl Into<String>) -> Self {
        Self {
            dialer,
            callback_host: callback_host.into(),
        }
    }
}

#[async_trait]
impl FunctionCallback for OutboundPhoneCallFn {
    fn name(&self) -> &str {
        OUTBOUND_PHONE_CALL_FN
    }

    async fn indication(&self, _message: &DialogMessage) -> String {
        "Dialing the number".to_string()
    }

    async fn execute(&self, message: &mut DialogMessage) -> FunctionResult<bool> {
        let raw = message.function_args.clone().unwrap_or_default();
        let args: OutboundCallArgs = serde_json::from_str(&raw)?;

        if !validate_phone_number(&args.phone_number) {
            let text = format!("Invalid phone number format: {}", args.phone_number);
            error!("{text}");
            message.content = text;
            return Ok(false);
        }

        if args.initial_message.trim().is_empty() {
            error!("initial message is empty");
            message.content = "There is an error when generating phone message.".to_string();
            return Ok(false);
        }

        // Fork a fresh conversation for the phone call
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let stream_url = format!(
            "{}/stream?conversation_id={conversation_id}",
            self.callback_host
        );

        let call_sid = self.dialer.dial(&args.phone_number, &stream_url).await?;
        debug!(%call_sid, %conversation_id, "outbound call placed");

        message.content = format!("The generated phone message: {}.", args.initial_message);
        message.stop_completion = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialog::AgentRole;
    use crate::core::functions::FunctionError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDialer {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl OutboundDialer for FakeDialer {
        async fn dial(&self, to: &str, stream_url: &str) -> FunctionResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((to.to_string(), stream_url.to_string()));
            Ok("CA0000".to_string())
        }
    }

    fn message_with_args(args: &str) -> DialogMessage {
        let mut msg = DialogMessage::new(AgentRole::User, "");
        msg.function_args = Some(args.to_string());
        msg
    }

    #[tokio::test]
    async fn test_successful_dial() {
        let dialer = Arc::new(FakeDialer::default());
        let callback = OutboundPhoneCallFn::new(dialer.clone(), "https://gw.example.com");
        let mut msg = message_with_args(
            r#"{"phone_number": "+14155552671", "initial_message": "Hello, checking in."}"#,
        );

        let result = callback.execute(&mut msg).await.unwrap();

        assert!(result);
        assert!(msg.stop_completion);
        assert_eq!(
            msg.content,
            "The generated phone message: Hello, checking in.."
        );
        let calls = dialer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "+14155552671");
        assert!(calls[0].1.starts_with("https://gw.example.com/stream?"));
    }

    #[tokio::test]
    async fn test_invalid_number_is_clean_failure() {
        let callback =
            OutboundPhoneCallFn::new(Arc::new(FakeDialer::default()), "https://gw.example.com");
        let mut msg =
            message_with_args(r#"{"phone_number": "12345", "initial_message": "Hello"}"#);

        let result = callback.execute(&mut msg).await.unwrap();

        assert!(!result);
        assert!(msg.content.contains("Invalid phone number format"));
    }

    #[tokio::test]
    async fn test_empty_initial_message_is_clean_failure() {
        let callback =
            OutboundPhoneCallFn::new(Arc::new(FakeDialer::default()), "https://gw.example.com");
        let mut msg =
            message_with_args(r#"{"phone_number": "+14155552671", "initial_message": "  "}"#);

        let result = callback.execute(&mut msg).await.unwrap();

        assert!(!result);
        assert!(msg.content.contains("error when generating phone message"));
    }

    #[tokio::test]
    async fn test_unparseable_args_surface_as_invalid_arguments() {
        let callback =
            OutboundPhoneCallFn::new(Arc::new(FakeDialer::default()), "https://gw.example.com");
        let mut msg = message_with_args("{this is not json");

        let err = callback.execute(&mut msg).await.unwrap_err();

        assert!(matches!(err, FunctionError::InvalidArguments(_)));
    }
}

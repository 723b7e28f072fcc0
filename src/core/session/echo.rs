//! Loopback model session.
//!
//! Echoes caller media back as model output and completes a turn when the
//! caller disconnects. Used as the default backend for development setups
//! without a model provider, and by the bridge integration tests.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use super::base::{
    BoxedModelSession, FunctionCallCallback, InterruptionCallback, ModelAudioCallback,
    ModelAudioChunk, ModelSessionBackend, ModelSessionFactory, SessionError, SessionErrorCallback,
    SessionResult, TurnCompleteCallback,
};
use crate::core::stream::{HubEvent, HubEventKind};

/// Model session that mirrors caller media back to the caller.
#[derive(Default)]
pub struct EchoModelSession {
    connected: bool,
    turns: u64,
    on_audio: Option<ModelAudioCallback>,
    on_turn_complete: Option<TurnCompleteCallback>,
}

impl EchoModelSession {
    /// Create a disconnected echo session.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelSessionBackend for EchoModelSession {
    async fn connect(&mut self) -> SessionResult<()> {
        self.connected = true;
        debug!("echo model session connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> SessionResult<()> {
        self.connected = false;
        debug!("echo model session released");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected
    }

    async fn send_event(&mut self, event: HubEvent) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }

        match event.kind {
            HubEventKind::UserConnected => {
                debug!(
                    conversation_id = event.conversation_id.as_deref().unwrap_or_default(),
                    "caller connected to echo session"
                );
            }
            HubEventKind::UserDataReceived => {
                let Some(payload) = event.data else {
                    return Ok(());
                };
                match BASE64.decode(&payload) {
                    Ok(bytes) => debug!(len = bytes.len(), "echoing caller media"),
                    Err(_) => {
                        debug!("caller payload is not base64, dropping");
                        return Ok(());
                    }
                }
                if let Some(callback) = &self.on_audio {
                    callback(ModelAudioChunk {
                        payload,
                        item_id: None,
                    })
                    .await;
                }
            }
            HubEventKind::UserDisconnected => {
                self.turns += 1;
                if let Some(callback) = &self.on_turn_complete {
                    callback(format!("echo-turn-{}", self.turns)).await;
                }
            }
            HubEventKind::Other(tag) => {
                debug!(%tag, "echo session ignoring pass-through event");
            }
        }
        Ok(())
    }

    async fn submit_function_result(&mut self, call_id: &str, result: &str) -> SessionResult<()> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        debug!(%call_id, len = result.len(), "echo session received function result");
        Ok(())
    }

    fn on_model_audio(&mut self, callback: ModelAudioCallback) -> SessionResult<()> {
        self.on_audio = Some(callback);
        Ok(())
    }

    fn on_turn_complete(&mut self, callback: TurnCompleteCallback) -> SessionResult<()> {
        self.on_turn_complete = Some(callback);
        Ok(())
    }

    // The echo session never interrupts, calls functions, or errors, so the
    // remaining callbacks are accepted and dropped.

    fn on_user_interrupted(&mut self, _callback: InterruptionCallback) -> SessionResult<()> {
        Ok(())
    }

    fn on_function_call(&mut self, _callback: FunctionCallCallback) -> SessionResult<()> {
        Ok(())
    }

    fn on_error(&mut self, _callback: SessionErrorCallback) -> SessionResult<()> {
        Ok(())
    }
}

/// Factory for [`EchoModelSession`].
pub struct EchoSessionFactory;

impl ModelSessionFactory for EchoSessionFactory {
    fn create(&self) -> SessionResult<BoxedModelSession> {
        Ok(Box::new(EchoModelSession::new()))
    }
}

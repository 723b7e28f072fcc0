//! Model-session backend abstraction.
//!
//! A model session is the collaborator representing a live connection to a
//! reasoning/speech model. The hub owns one backend per realtime
//! connection, feeds it canonical events, and receives model-originated
//! events through registered callbacks.

mod base;
mod echo;

pub use base::{
    BoxedModelSession, FunctionCallCallback, FunctionCallRequest, InterruptionCallback,
    ModelAudioCallback, ModelAudioChunk, ModelSessionBackend, ModelSessionFactory, SessionError,
    SessionErrorCallback, SessionResult, TurnCompleteCallback,
};
pub use echo::{EchoModelSession, EchoSessionFactory};

use std::sync::Arc;

/// Resolve a configured backend name to its factory.
pub fn create_session_factory(backend: &str) -> SessionResult<Arc<dyn ModelSessionFactory>> {
    match backend.to_lowercase().as_str() {
        "echo" => Ok(Arc::new(EchoSessionFactory)),
        other => Err(SessionError::InvalidConfiguration(format!(
            "unsupported model backend: {other}. Supported: {:?}",
            supported_model_backends()
        ))),
    }
}

/// Names of the model backends this build can create.
pub fn supported_model_backends() -> Vec<&'static str> {
    vec!["echo"]
}

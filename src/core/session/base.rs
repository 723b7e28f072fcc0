//! Base trait and types for model-session backends.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::core::stream::HubEvent;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised by a model session.
///
/// The variants keep the failure causes distinguishable so the hub can tag
/// its `Closing` transition for observability.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection to the model backend failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The model backend reported an error
    #[error("model backend error: {0}")]
    Backend(String),

    /// The vendor did not respond in time
    #[error("vendor timeout: {0}")]
    VendorTimeout(String),

    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Event could not be serialized for the backend
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Operation attempted before connect
    #[error("not connected")]
    NotConnected,
}

/// Result type for model-session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Model-originated events
// =============================================================================

/// A chunk of model output destined for the caller.
#[derive(Debug, Clone)]
pub struct ModelAudioChunk {
    /// Base64 payload in the vendor's media encoding.
    pub payload: String,
    /// Backend item identifier, when the backend provides one.
    pub item_id: Option<String>,
}

/// Function call requested by the model mid-conversation.
#[derive(Debug, Clone)]
pub struct FunctionCallRequest {
    /// Call identifier echoed back with the result.
    pub call_id: String,
    /// Function name to dispatch.
    pub name: String,
    /// Raw JSON arguments.
    pub arguments: String,
}

// =============================================================================
// Callback Types
// =============================================================================

/// Callback type for model audio output.
pub type ModelAudioCallback =
    Arc<dyn Fn(ModelAudioChunk) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for model turn/response completion; carries the response id.
pub type TurnCompleteCallback =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for detected user interruption (barge-in).
pub type InterruptionCallback =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for model function-call requests.
pub type FunctionCallCallback =
    Arc<dyn Fn(FunctionCallRequest) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Callback type for backend errors.
pub type SessionErrorCallback =
    Arc<dyn Fn(SessionError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

// =============================================================================
// Base Trait
// =============================================================================

/// A live connection to a reasoning/speech model.
///
/// Callbacks must be registered before [`connect`](Self::connect); the
/// backend delivers model-originated events asynchronously, out of order
/// relative to [`send_event`](Self::send_event) calls.
#[async_trait]
pub trait ModelSessionBackend: Send + Sync {
    /// Open the model session.
    async fn connect(&mut self) -> SessionResult<()>;

    /// Release the model session. The hub calls this exactly once at
    /// teardown.
    async fn disconnect(&mut self) -> SessionResult<()>;

    /// Whether the session is connected and ready.
    fn is_ready(&self) -> bool;

    /// Forward a canonical hub event to the model.
    async fn send_event(&mut self, event: HubEvent) -> SessionResult<()>;

    /// Submit the result of a dispatched function call.
    async fn submit_function_result(&mut self, call_id: &str, result: &str) -> SessionResult<()>;

    // -------------------------------------------------------------------------
    // Callbacks
    // -------------------------------------------------------------------------

    /// Register a callback for model audio output.
    fn on_model_audio(&mut self, callback: ModelAudioCallback) -> SessionResult<()>;

    /// Register a callback for turn completion.
    fn on_turn_complete(&mut self, callback: TurnCompleteCallback) -> SessionResult<()>;

    /// Register a callback for detected user interruption.
    fn on_user_interrupted(&mut self, callback: InterruptionCallback) -> SessionResult<()>;

    /// Register a callback for model function-call requests.
    fn on_function_call(&mut self, callback: FunctionCallCallback) -> SessionResult<()>;

    /// Register a callback for backend errors.
    fn on_error(&mut self, callback: SessionErrorCallback) -> SessionResult<()>;
}

/// Boxed trait object for model sessions.
pub type BoxedModelSession = Box<dyn ModelSessionBackend>;

/// Creates one backend per accepted realtime connection.
pub trait ModelSessionFactory: Send + Sync {
    /// Create a new, not-yet-connected model session.
    fn create(&self) -> SessionResult<BoxedModelSession>;
}

pub mod dialog;
pub mod functions;
pub mod hooks;
pub mod session;
pub mod stream;

// Re-export commonly used types for convenience
pub use dialog::{AgentRole, DialogMessage};
pub use functions::{
    FunctionCallback, FunctionDispatcher, FunctionError, FunctionRegistry, FunctionResult,
    OUTBOUND_PHONE_CALL_FN, OutboundDialer, OutboundPhoneCallFn,
};
pub use hooks::{CallTraceHook, DialogHook, HookChain, HookError, HookResult, ProgressObserver};
pub use session::{
    BoxedModelSession, EchoModelSession, EchoSessionFactory, FunctionCallRequest, ModelAudioChunk,
    ModelSessionBackend, ModelSessionFactory, SessionError, SessionResult, create_session_factory,
    supported_model_backends,
};
pub use stream::{
    FrameDecodeError, HubEvent, HubEventKind, OutboundEncoder, OutboundFrame, RESPONSE_PART_MARK,
    StreamConnection, decode_frame,
};

//! Function callback abstraction and dispatch.
//!
//! A function callback is a named, side-effecting action the reasoning engine
//! can request by name. Callbacks are registered once at startup into a
//! [`FunctionRegistry`] and invoked through the [`FunctionDispatcher`], which
//! wraps every execution with hook notification, isolation, and result
//! merging.

mod dispatcher;
mod outbound_call;
mod registry;

pub use dispatcher::FunctionDispatcher;
pub use outbound_call::{OUTBOUND_PHONE_CALL_FN, OutboundDialer, OutboundPhoneCallFn};
pub use registry::FunctionRegistry;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::dialog::DialogMessage;

/// Errors raised by function callbacks.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// The function argument text was not parseable as JSON.
    #[error("invalid JSON in function arguments: {0}")]
    InvalidArguments(String),

    /// Any other failure raised during execution.
    #[error("{0}")]
    Execution(String),
}

impl From<serde_json::Error> for FunctionError {
    fn from(err: serde_json::Error) -> Self {
        FunctionError::InvalidArguments(err.to_string())
    }
}

/// Result type for function callbacks.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// A named executable action requested by the reasoning engine.
///
/// The `execute` contract: the callback receives the isolated working copy of
/// the conversational message, mutates it freely, and reports whether the
/// action itself succeeded. Terminal failures are returned as errors and
/// contained by the dispatcher; they never cross the dispatch boundary.
#[async_trait]
pub trait FunctionCallback: Send + Sync {
    /// Unique name used for registry lookup.
    fn name(&self) -> &str;

    /// Human-readable progress text for this invocation.
    async fn indication(&self, message: &DialogMessage) -> String {
        let _ = message;
        String::new()
    }

    /// Execute the action against the working copy of the message.
    async fn execute(&self, message: &mut DialogMessage) -> FunctionResult<bool>;
}

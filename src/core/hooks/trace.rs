//! Call tracing as an ordinary hook.
//!
//! Entry/exit tracing of function calls is expressed as a registered hook
//! with the same contract as every other observer, rather than ambient
//! instrumentation woven around the dispatcher.

use async_trait::async_trait;
use tracing::debug;

use super::{DialogHook, HookResult};
use crate::core::dialog::DialogMessage;

/// Logs the begin and end of every function call.
pub struct CallTraceHook {
    enabled: bool,
}

impl CallTraceHook {
    /// Create a trace hook; when `enabled` is false the hook is a no-op so
    /// it can stay registered regardless of configuration.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl DialogHook for CallTraceHook {
    fn name(&self) -> &str {
        "call_trace"
    }

    // Runs before any policy hook.
    fn priority(&self) -> i32 {
        -100
    }

    async fn on_function_executing(&self, message: &mut DialogMessage) -> HookResult<()> {
        if self.enabled {
            debug!(
                function = message.function_name.as_deref().unwrap_or("<unnamed>"),
                "begin calling function"
            );
        }
        Ok(())
    }

    async fn on_function_executed(&self, message: &mut DialogMessage) -> HookResult<()> {
        if self.enabled {
            debug!(
                function = message.function_name.as_deref().unwrap_or("<unnamed>"),
                stop_completion = message.stop_completion,
                "end calling function"
            );
        }
        Ok(())
    }
}

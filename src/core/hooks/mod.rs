//! Ordered observers invoked around function execution.
//!
//! Hooks carry cross-cutting policy (tracing, guardrails, progress
//! reporting) without coupling the dispatcher to concrete policies. The
//! chain is built at startup and never mutated during a dispatch.

mod trace;

pub use trace::CallTraceHook;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::dialog::DialogMessage;

/// Failure raised by a hook or progress observer.
#[derive(Debug, Error)]
#[error("hook {hook} failed: {message}")]
pub struct HookError {
    hook: String,
    message: String,
}

impl HookError {
    /// Create an error attributed to the named hook.
    pub fn new(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Result type for hook notifications.
pub type HookResult<T> = Result<T, HookError>;

/// Observer invoked before and after every function execution.
///
/// Hooks may mutate the working copy of the message; later hooks see the
/// side effects of earlier ones, which is why the chain is awaited
/// sequentially and never in parallel.
#[async_trait]
pub trait DialogHook: Send + Sync {
    /// Name used in logs and error attribution.
    fn name(&self) -> &str;

    /// Ordering priority. Lower values run first; ties keep registration
    /// order.
    fn priority(&self) -> i32 {
        0
    }

    /// Called before the callback executes.
    async fn on_function_executing(&self, message: &mut DialogMessage) -> HookResult<()>;

    /// Called after the callback executed successfully.
    async fn on_function_executed(&self, message: &mut DialogMessage) -> HookResult<()>;
}

/// Advisory observer notified when a function starts executing.
///
/// Unlike hooks, observer failures never abort a dispatch; the dispatcher
/// logs and continues.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Called with the working copy (indication already applied) before
    /// execution.
    async fn on_function_executing(&self, message: &DialogMessage) -> HookResult<()>;
}

/// Priority-ordered hook chain.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn DialogHook>>,
}

impl HookChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook. The chain re-sorts on every registration; the sort
    /// is stable so hooks with equal priority keep their registration order.
    pub fn register(&mut self, hook: Arc<dyn DialogHook>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|h| h.priority());
    }

    /// Hooks in their stable invocation order.
    pub fn ordered(&self) -> &[Arc<dyn DialogHook>] {
        &self.hooks
    }

    /// Notify every hook that a function is about to execute, in order,
    /// stopping at the first failure.
    pub async fn notify_executing(&self, message: &mut DialogMessage) -> HookResult<()> {
        for hook in &self.hooks {
            hook.on_function_executing(message).await?;
        }
        Ok(())
    }

    /// Notify every hook that a function executed, in order, stopping at the
    /// first failure.
    pub async fn notify_executed(&self, message: &mut DialogMessage) -> HookResult<()> {
        for hook in &self.hooks {
            hook.on_function_executed(message).await?;
        }
        Ok(())
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialog::AgentRole;

    struct TagHook {
        label: &'static str,
        priority: i32,
    }

    #[async_trait]
    impl DialogHook for TagHook {
        fn name(&self) -> &str {
            self.label
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn on_function_executing(&self, message: &mut DialogMessage) -> HookResult<()> {
            message.content.push_str(self.label);
            message.content.push(';');
            Ok(())
        }

        async fn on_function_executed(&self, _message: &mut DialogMessage) -> HookResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_priority_order_with_stable_ties() {
        let mut chain = HookChain::new();
        chain.register(Arc::new(TagHook {
            label: "b",
            priority: 5,
        }));
        chain.register(Arc::new(TagHook {
            label: "a",
            priority: 1,
        }));
        chain.register(Arc::new(TagHook {
            label: "c",
            priority: 5,
        }));

        let order: Vec<&str> = chain.ordered().iter().map(|h| h.name()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        let mut msg = DialogMessage::new(AgentRole::User, "");
        chain.notify_executing(&mut msg).await.unwrap();
        assert_eq!(msg.content, "a;b;c;");
    }

    #[tokio::test]
    async fn test_order_is_stable_across_calls() {
        let mut chain = HookChain::new();
        chain.register(Arc::new(TagHook {
            label: "x",
            priority: 0,
        }));
        chain.register(Arc::new(TagHook {
            label: "y",
            priority: 0,
        }));

        for _ in 0..3 {
            let mut msg = DialogMessage::new(AgentRole::User, "");
            chain.notify_executing(&mut msg).await.unwrap();
            assert_eq!(msg.content, "x;y;");
        }
    }

    struct FailSecond;

    #[async_trait]
    impl DialogHook for FailSecond {
        fn name(&self) -> &str {
            "fail_second"
        }

        async fn on_function_executing(&self, _message: &mut DialogMessage) -> HookResult<()> {
            Err(HookError::new("fail_second", "boom"))
        }

        async fn on_function_executed(&self, _message: &mut DialogMessage) -> HookResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_failure_stops_chain() {
        let mut chain = HookChain::new();
        chain.register(Arc::new(TagHook {
            label: "first",
            priority: 0,
        }));
        chain.register(Arc::new(FailSecond));
        chain.register(Arc::new(TagHook {
            label: "third",
            priority: 9,
        }));

        let mut msg = DialogMessage::new(AgentRole::User, "");
        let err = chain.notify_executing(&mut msg).await.unwrap_err();
        assert!(err.to_string().contains("fail_second"));
        // The third hook never ran
        assert_eq!(msg.content, "first;");
    }
}

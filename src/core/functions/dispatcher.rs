//! Function dispatch pipeline.
//!
//! Orchestrates a single function call: registry lookup, working-copy
//! isolation, hook and progress notification, execution with error
//! containment, and selective merge back into the canonical message.

use std::sync::Arc;
use tracing::{error, warn};

use super::{FunctionCallback, FunctionError, FunctionRegistry};
use crate::core::dialog::DialogMessage;
use crate::core::hooks::{HookChain, ProgressObserver};

/// Dispatches named function calls requested by the reasoning engine.
///
/// Collaborators are passed at construction; the dispatcher holds no other
/// state and is safe to share across concurrent dispatches.
pub struct FunctionDispatcher {
    registry: Arc<FunctionRegistry>,
    hooks: Arc<HookChain>,
    progress: Option<Arc<dyn ProgressObserver>>,
}

impl FunctionDispatcher {
    /// Create a dispatcher over the given registry and hook chain.
    pub fn new(registry: Arc<FunctionRegistry>, hooks: Arc<HookChain>) -> Self {
        Self {
            registry,
            hooks,
            progress: None,
        }
    }

    /// Attach an advisory progress observer.
    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(observer);
        self
    }

    /// Invoke the function `name` against `message`.
    ///
    /// The canonical `message` is mutated in place: on success the executed
    /// working copy is merged back (excluding the attachment payload); on any
    /// failure the stop flag is raised and the content carries the failure
    /// text. Errors never propagate past this method.
    pub async fn invoke(&self, name: &str, message: &mut DialogMessage) -> bool {
        let Some(callback) = self.registry.find(name) else {
            message.stop_completion = true;
            message.content = format!("Can't find function implementation of {name}");
            error!("{}", message.content);
            return false;
        };

        // Clone message
        let mut working = message.clone();
        working.function_name = Some(name.to_string());
        working.indication = Some(callback.indication(message).await);

        if let Some(observer) = &self.progress {
            if let Err(e) = observer.on_function_executing(&working).await {
                warn!(function = name, error = %e, "progress observer failed, continuing");
            }
        }

        let mut succeeded = false;

        if let Err(e) = self.hooks.notify_executing(&mut working).await {
            error!(function = name, error = %e, "pre-execution hook failed");
            message.stop_completion = true;
            message.content = e.to_string();
        } else {
            match callback.execute(&mut working).await {
                Ok(result) => match self.hooks.notify_executed(&mut working).await {
                    Ok(()) => {
                        message.apply_function_result(&working);
                        succeeded = result;
                    }
                    Err(e) => {
                        error!(function = name, error = %e, "post-execution hook failed");
                        message.stop_completion = true;
                        message.content = e.to_string();
                    }
                },
                Err(e @ FunctionError::InvalidArguments(_)) => {
                    error!(
                        function = name,
                        args = working.function_args.as_deref().unwrap_or_default(),
                        "function arguments are not parseable JSON"
                    );
                    message.stop_completion = true;
                    message.content = e.to_string();
                }
                Err(e) => {
                    error!(function = name, error = %e, "function execution failed");
                    message.stop_completion = true;
                    message.content = e.to_string();
                }
            }
        }

        // Make sure content has been populated
        if message.content.is_empty() && message.has_data() {
            if let Some(data) = &message.data {
                message.content = data.to_string();
            }
        }

        succeeded
    }
}

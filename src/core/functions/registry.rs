//! Function callback registry.
//!
//! Callbacks are registered during process startup and the registry is
//! treated as immutable afterwards, so concurrent dispatches can look up
//! callbacks without coordination.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::FunctionCallback;

/// Queryable collection of named function callbacks.
#[derive(Default)]
pub struct FunctionRegistry {
    callbacks: DashMap<String, Arc<dyn FunctionCallback>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            callbacks: DashMap::new(),
        }
    }

    /// Register a callback under its own name.
    ///
    /// Registering a second callback with the same name replaces the first
    /// and logs a warning; the last registration wins.
    pub fn register(&self, callback: Arc<dyn FunctionCallback>) {
        let name = callback.name().to_string();
        if self.callbacks.insert(name.clone(), callback).is_some() {
            warn!(function = %name, "replacing previously registered function callback");
        } else {
            debug!(function = %name, "registered function callback");
        }
    }

    /// Look up a callback by exact name. Returns `None` on a miss, never
    /// panics.
    pub fn find(&self, name: &str) -> Option<Arc<dyn FunctionCallback>> {
        self.callbacks.get(name).map(|entry| entry.value().clone())
    }

    /// Names of all registered callbacks, sorted for deterministic output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.callbacks.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dialog::DialogMessage;
    use crate::core::functions::FunctionResult;
    use async_trait::async_trait;

    struct NamedFn(&'static str);

    #[async_trait]
    impl FunctionCallback for NamedFn {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self, _message: &mut DialogMessage) -> FunctionResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_find_returns_none_on_miss() {
        let registry = FunctionRegistry::new();
        assert!(registry.find("missing").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_and_find() {
        let registry = FunctionRegistry::new();
        registry.register(Arc::new(NamedFn("get_weather")));
        registry.register(Arc::new(NamedFn("lookup_order")));

        assert_eq!(registry.len(), 2);
        assert!(registry.find("get_weather").is_some());
        assert!(registry.find("GET_WEATHER").is_none(), "lookup is exact");
        assert_eq!(registry.names(), vec!["get_weather", "lookup_order"]);
    }

    #[test]
    fn test_register_duplicate_keeps_last() {
        let registry = FunctionRegistry::new();
        registry.register(Arc::new(NamedFn("get_weather")));
        registry.register(Arc::new(NamedFn("get_weather")));
        assert_eq!(registry.len(), 1);
    }
}

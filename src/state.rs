//! Shared application state.
//!
//! Collaborators are passed in at construction and shared read-only across
//! sessions; the only mutable state is the connection accounting used by
//! the connection-limit middleware.

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::core::functions::FunctionDispatcher;
use crate::core::session::ModelSessionFactory;

/// Why a connection slot could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    /// Global stream session cap reached
    GlobalLimitReached,
    /// Per-IP stream session cap reached
    PerIpLimitReached,
}

/// State shared by all handlers.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Dispatcher the hub routes model function-call requests through.
    pub dispatcher: Arc<FunctionDispatcher>,
    /// Factory creating one model session per stream connection.
    pub sessions: Arc<dyn ModelSessionFactory>,
    /// Cancelled when the host shuts down; live sessions drain and close.
    pub shutdown: CancellationToken,

    active_connections: AtomicUsize,
    connections_per_ip: DashMap<IpAddr, usize>,
}

impl AppState {
    /// Assemble the shared state from its collaborators.
    pub fn new(
        config: ServerConfig,
        dispatcher: Arc<FunctionDispatcher>,
        sessions: Arc<dyn ModelSessionFactory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            dispatcher,
            sessions,
            shutdown: CancellationToken::new(),
            active_connections: AtomicUsize::new(0),
            connections_per_ip: DashMap::new(),
        })
    }

    /// Reserve a stream session slot for `ip`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        if let Some(max) = self.config.max_stream_connections {
            if self.active_connections.load(Ordering::Acquire) >= max {
                return Err(ConnectionLimitError::GlobalLimitReached);
            }
        }

        let mut per_ip = self.connections_per_ip.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip {
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *per_ip += 1;
        drop(per_ip);

        self.active_connections.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Release a previously acquired slot.
    pub fn release_connection(&self, ip: IpAddr) {
        let mut empty = false;
        if let Some(mut count) = self.connections_per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
            empty = *count == 0;
        }
        if empty {
            self.connections_per_ip.remove_if(&ip, |_, count| *count == 0);
        }

        let _ = self
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Number of live stream sessions.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::functions::FunctionRegistry;
    use crate::core::hooks::HookChain;
    use crate::core::session::EchoSessionFactory;
    use std::net::Ipv4Addr;

    fn state_with(config: ServerConfig) -> Arc<AppState> {
        let dispatcher = Arc::new(FunctionDispatcher::new(
            Arc::new(FunctionRegistry::new()),
            Arc::new(HookChain::new()),
        ));
        AppState::new(config, dispatcher, Arc::new(EchoSessionFactory))
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_acquire_and_release() {
        let state = state_with(ServerConfig::default());

        state.try_acquire_connection(ip(1)).unwrap();
        state.try_acquire_connection(ip(1)).unwrap();
        assert_eq!(state.active_connections(), 2);

        state.release_connection(ip(1));
        state.release_connection(ip(1));
        assert_eq!(state.active_connections(), 0);

        // Releasing beyond zero is a no-op
        state.release_connection(ip(1));
        assert_eq!(state.active_connections(), 0);
    }

    #[test]
    fn test_per_ip_limit() {
        let config = ServerConfig {
            max_connections_per_ip: 2,
            ..Default::default()
        };
        let state = state_with(config);

        state.try_acquire_connection(ip(1)).unwrap();
        state.try_acquire_connection(ip(1)).unwrap();
        assert_eq!(
            state.try_acquire_connection(ip(1)),
            Err(ConnectionLimitError::PerIpLimitReached)
        );
        // A different IP is unaffected
        state.try_acquire_connection(ip(2)).unwrap();
    }

    #[test]
    fn test_global_limit() {
        let config = ServerConfig {
            max_stream_connections: Some(1),
            ..Default::default()
        };
        let state = state_with(config);

        state.try_acquire_connection(ip(1)).unwrap();
        assert_eq!(
            state.try_acquire_connection(ip(2)),
            Err(ConnectionLimitError::GlobalLimitReached)
        );

        state.release_connection(ip(1));
        state.try_acquire_connection(ip(2)).unwrap();
    }
}

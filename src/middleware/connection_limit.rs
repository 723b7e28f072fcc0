//! Connection limit middleware for stream WebSocket connections.
//!
//! Enforces the global and per-IP caps on concurrent stream sessions
//! before the WebSocket upgrade happens. Non-upgrade requests pass
//! through untouched.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::{AppState, ConnectionLimitError};

/// Extension carrying the client IP through to the handler so it can
/// release the connection slot when the session ends.
#[derive(Clone, Debug)]
pub struct ClientIp(pub IpAddr);

/// Middleware enforcing stream session limits.
///
/// Returns 503 when the global cap is reached and 429 when the per-IP cap
/// is reached; on success it injects [`ClientIp`] for the handler's
/// release call.
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    match state.try_acquire_connection(client_ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(client_ip));
            next.run(request).await
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(ip = %client_ip, "rejecting stream connection: global limit reached");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Server at capacity. Please try again later.",
            )
                .into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(ip = %client_ip, "rejecting stream connection: per-IP limit reached");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many connections from your IP address.",
            )
                .into_response()
        }
    }
}

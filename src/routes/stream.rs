//! Stream bridge WebSocket route configuration
//!
//! # Endpoint
//!
//! `GET /stream` - WebSocket upgrade for the telephony media stream
//!
//! # Protocol
//!
//! After the upgrade the vendor sends framed JSON events (`start`,
//! `media`, `stop`); the server answers with `media`, `mark`, and `clear`
//! frames carrying model output. See the handler module docs for the
//! frame shapes.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::stream::stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the stream WebSocket router
pub fn create_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stream", get(stream_handler))
        .layer(TraceLayer::new_for_http())
}

//! Stream bridge WebSocket handler.
//!
//! Owns one duplex transport per accepted connection: decodes inbound
//! vendor frames, forwards canonical events to the model session, and
//! writes model-originated frames back through a single serialized writer.

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tracing::{debug, error, info, warn};

use crate::core::dialog::{AgentRole, DialogMessage};
use crate::core::session::{
    FunctionCallRequest, ModelSessionBackend, ModelSessionFactory, SessionError,
};
use crate::core::stream::{HubEventKind, OutboundFrame, StreamConnection, decode_frame};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Channel buffer between producers and the transport writer
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (1 MB). Telephony frames are small.
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How often we check if the connection is stale
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Per-session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closing => write!(f, "closing"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Why the session left `Active`. Kept distinguishable for observability.
enum CloseCause {
    ClientDisconnected,
    Transport(String),
    Backend(SessionError),
    IdleTimeout,
    HostShutdown,
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseCause::ClientDisconnected => write!(f, "client disconnected"),
            CloseCause::Transport(e) => write!(f, "transport error: {e}"),
            CloseCause::Backend(e) => write!(f, "model session error: {e}"),
            CloseCause::IdleTimeout => write!(f, "idle timeout"),
            CloseCause::HostShutdown => write!(f, "host shutdown"),
        }
    }
}

/// Routing for the serialized transport writer.
enum StreamRoute {
    Frame(OutboundFrame),
    Close,
}

/// Stream bridge WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket and runs one independent
/// session loop for its lifetime.
pub async fn stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(ClientIp(client_ip)): Extension<ClientIp>,
) -> Response {
    info!(ip = %client_ip, "stream WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_stream_socket(socket, state, client_ip))
}

/// Run the session loop for one accepted stream connection.
async fn handle_stream_socket(socket: WebSocket, app_state: Arc<AppState>, client_ip: IpAddr) {
    let mut session_state = SessionState::Connecting;
    info!(state = %session_state, "stream session accepted");

    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<StreamRoute>(CHANNEL_BUFFER_SIZE);

    // The single transport writer. Inbound processing and model-event
    // delivery both produce frames; writes must never race.
    let sender_task = tokio::spawn(async move {
        while let Some(route) = frame_rx.recv().await {
            let result = match route {
                StreamRoute::Frame(frame) => match serde_json::to_string(&frame) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("failed to serialize outbound frame: {e}");
                        continue;
                    }
                },
                StreamRoute::Close => {
                    info!("closing stream transport");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                error!("failed to write stream frame: {e}");
                break;
            }
        }
    });

    let connection = Arc::new(RwLock::new(StreamConnection::new()));
    let (close_tx, mut close_rx) = mpsc::channel::<SessionError>(1);
    let (call_tx, mut call_rx) = mpsc::channel::<FunctionCallRequest>(16);

    let mut backend = match app_state.sessions.create() {
        Ok(backend) => backend,
        Err(e) => {
            error!(error = %e, "failed to create model session");
            let _ = frame_tx.send(StreamRoute::Close).await;
            let _ = sender_task.await;
            app_state.release_connection(client_ip);
            return;
        }
    };

    register_backend_callbacks(backend.as_mut(), &connection, &frame_tx, &close_tx, &call_tx);

    if let Err(e) = backend.connect().await {
        error!(error = %e, "model session connect failed");
        let _ = frame_tx.send(StreamRoute::Close).await;
        let _ = sender_task.await;
        app_state.release_connection(client_ip);
        return;
    }

    session_state = SessionState::Active;
    debug!(state = %session_state, "stream session active");

    let idle_timeout = Duration::from_secs(app_state.config.stream_idle_timeout_secs);
    let mut last_activity = std::time::Instant::now();

    let close_cause = loop {
        select! {
            msg_result = receiver.next() => {
                last_activity = std::time::Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        if let Some(cause) =
                            process_stream_frame(msg, &connection, backend.as_mut()).await
                        {
                            break cause;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("stream transport error: {e}");
                        break CloseCause::Transport(e.to_string());
                    }
                    None => break CloseCause::ClientDisconnected,
                }
            }
            Some(err) = close_rx.recv() => {
                break CloseCause::Backend(err);
            }
            Some(call) = call_rx.recv() => {
                handle_function_call(call, backend.as_mut(), &app_state).await;
            }
            _ = app_state.shutdown.cancelled() => {
                break CloseCause::HostShutdown;
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > idle_timeout {
                    warn!(
                        idle_secs = last_activity.elapsed().as_secs(),
                        "closing stale stream session"
                    );
                    break CloseCause::IdleTimeout;
                }
                debug!("stream session idle check - still active");
            }
        }
    };

    session_state = SessionState::Closing;
    info!(state = %session_state, cause = %close_cause, "stream session closing");

    let _ = frame_tx.send(StreamRoute::Close).await;
    sender_task.abort();

    // The model session handle is owned by this loop and released exactly once.
    if let Err(e) = backend.disconnect().await {
        error!(error = %e, "failed to release model session");
    }

    app_state.release_connection(client_ip);

    session_state = SessionState::Closed;
    info!(state = %session_state, "stream session terminated");
}

/// Wire the backend's model-originated events to the transport writer.
///
/// Each callback encodes through the connection's bound encoder. Until the
/// first inbound frame binds the stream identity there is nothing to
/// address frames to, so model events arriving that early are dropped.
fn register_backend_callbacks(
    backend: &mut dyn ModelSessionBackend,
    connection: &Arc<RwLock<StreamConnection>>,
    frame_tx: &mpsc::Sender<StreamRoute>,
    close_tx: &mpsc::Sender<SessionError>,
    call_tx: &mpsc::Sender<FunctionCallRequest>,
) {
    let conn = connection.clone();
    let tx = frame_tx.clone();
    backend
        .on_model_audio(Arc::new(move |chunk| {
            let frame = conn
                .read()
                .encoder()
                .map(|enc| enc.model_message_frame(&chunk.payload));
            let tx = tx.clone();
            Box::pin(async move {
                match frame {
                    Some(frame) => {
                        let _ = tx.send(StreamRoute::Frame(frame)).await;
                    }
                    None => debug!("model audio before stream start, dropping"),
                }
            })
        }))
        .ok();

    let conn = connection.clone();
    let tx = frame_tx.clone();
    backend
        .on_turn_complete(Arc::new(move |response_id| {
            let frame = conn.read().encoder().map(|enc| enc.response_done_frame());
            let tx = tx.clone();
            Box::pin(async move {
                match frame {
                    Some(frame) => {
                        debug!(%response_id, "model turn complete");
                        let _ = tx.send(StreamRoute::Frame(frame)).await;
                    }
                    None => debug!(%response_id, "turn complete before stream start, dropping"),
                }
            })
        }))
        .ok();

    let conn = connection.clone();
    let tx = frame_tx.clone();
    backend
        .on_user_interrupted(Arc::new(move || {
            let frame = conn.read().encoder().map(|enc| enc.interrupt_frame());
            let tx = tx.clone();
            Box::pin(async move {
                match frame {
                    Some(frame) => {
                        let _ = tx.send(StreamRoute::Frame(frame)).await;
                    }
                    None => debug!("interruption before stream start, dropping"),
                }
            })
        }))
        .ok();

    let tx = call_tx.clone();
    backend
        .on_function_call(Arc::new(move |call| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(call).await;
            })
        }))
        .ok();

    let tx = close_tx.clone();
    backend
        .on_error(Arc::new(move |err| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(err).await;
            })
        }))
        .ok();
}

/// Process one inbound transport message.
///
/// Returns the close cause when the session must end; `None` keeps it
/// alive. A malformed frame is logged and dropped so one bad frame never
/// tears down a live call.
async fn process_stream_frame(
    msg: Message,
    connection: &Arc<RwLock<StreamConnection>>,
    backend: &mut dyn ModelSessionBackend,
) -> Option<CloseCause> {
    match msg {
        Message::Text(text) => {
            let decoded = {
                let mut conn = connection.write();
                decode_frame(&text, &mut conn)
            };

            let event = match decoded {
                Ok(Some(event)) => event,
                Ok(None) => {
                    debug!("frame carried no event, skipping");
                    return None;
                }
                Err(e) => {
                    warn!(error = %e, "dropping malformed stream frame");
                    return None;
                }
            };

            if event.kind == HubEventKind::UserConnected {
                info!(
                    stream_sid = %event.stream_sid,
                    conversation_id = event.conversation_id.as_deref().unwrap_or_default(),
                    "caller stream started"
                );
            }

            if let Err(e) = backend.send_event(event).await {
                return Some(CloseCause::Backend(e));
            }
            None
        }
        Message::Binary(data) => {
            warn!(
                len = data.len(),
                "unexpected binary frame on stream transport, dropping"
            );
            None
        }
        Message::Ping(_) | Message::Pong(_) => {
            debug!("websocket keepalive");
            None
        }
        Message::Close(_) => {
            info!("stream close frame received");
            Some(CloseCause::ClientDisconnected)
        }
    }
}

/// Dispatch a model-requested function call and hand the result back.
///
/// Runs inside the session loop, so dispatches are sequential per session.
async fn handle_function_call(
    call: FunctionCallRequest,
    backend: &mut dyn ModelSessionBackend,
    app_state: &Arc<AppState>,
) {
    debug!(function = %call.name, call_id = %call.call_id, "model requested function call");

    let mut message = DialogMessage::new(AgentRole::User, "");
    message.function_name = Some(call.name.clone());
    message.function_args = Some(call.arguments.clone());

    let succeeded = app_state.dispatcher.invoke(&call.name, &mut message).await;
    debug!(function = %call.name, succeeded, "function dispatch finished");

    if let Err(e) = backend
        .submit_function_result(&call.call_id, &message.content)
        .await
    {
        warn!(error = %e, call_id = %call.call_id, "failed to submit function result");
    }
}

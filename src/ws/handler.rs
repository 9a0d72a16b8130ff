//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{ArenaHandle, SESSION_QUEUE_CAPACITY};
use crate::util::rate_limit::SessionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Every socket gets a fresh session id.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let session_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state.arena))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: Uuid, arena: ArenaHandle) {
    info!(session_id = %session_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(SESSION_QUEUE_CAPACITY);

    if arena.connect(session_id, outbound_tx).await.is_err() {
        error!(session_id = %session_id, "Arena unavailable, dropping connection");
        return;
    }

    run_session(session_id, &arena, ws_sink, ws_stream, outbound_rx).await;

    // the arena may already have dropped a stalled session; a second disconnect is a no-op
    let _ = arena.disconnect(session_id).await;

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: Uuid,
    arena: &ArenaHandle,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
) {
    let rate_limiter = SessionRateLimiter::new();

    // Writer task: arena queue -> WebSocket, in queue order
    let mut writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                return;
            }
        }
        // queue closed by the arena: the client could not keep up
        let _ = ws_sink.send(Message::Close(None)).await;
    });

    // Reader loop: WebSocket -> arena
    loop {
        let frame = tokio::select! {
            _ = &mut writer => {
                debug!(session_id = %session_id, "Writer finished, closing session");
                break;
            }
            frame = ws_stream.next() => frame,
        };

        let Some(result) = frame else {
            break;
        };

        match result {
            Ok(Message::Text(text)) => {
                let Some(msg) = decode_frame(session_id, &rate_limiter, &text) else {
                    continue;
                };
                if arena.client_msg(session_id, msg).await.is_err() {
                    debug!(session_id = %session_id, "Arena channel closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer.abort();
}

/// Parse one text frame. Malformed or over-quota frames are dropped; the session stays open.
fn decode_frame(session_id: Uuid, limiter: &SessionRateLimiter, text: &str) -> Option<ClientMsg> {
    let msg = match serde_json::from_str::<ClientMsg>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to parse client message");
            return None;
        }
    };

    let allowed = if msg.is_control() {
        limiter.check_control()
    } else {
        limiter.check_input()
    };
    if !allowed {
        warn!(session_id = %session_id, "Rate limited input message");
        return None;
    }

    Some(msg)
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

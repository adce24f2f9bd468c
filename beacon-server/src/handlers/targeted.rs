use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::handlers::socket::write_loop;
use crate::state::AppState;
use crate::ws::{Connection, InboundFrame};

/// Handle an upgrade on the targeted-notification path.
pub async fn targeted_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Targeted notification connection.
///
/// The client self-identifies with `{"action":"register","userId":...}`; the
/// routing table keeps at most one connection per user id, last write wins.
/// Re-registration while open is allowed, unparseable frames are dropped
/// without closing the socket, and every table entry pointing here is
/// removed on close.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(64);

    let connection = Arc::new(Connection::new(tx));
    let conn_id = connection.id;
    tracing::info!(conn_id = %conn_id, "notification client connected");

    let writer = tokio::spawn(write_loop(
        sink,
        rx,
        Arc::clone(&connection),
        state.config.heartbeat_interval,
        state.config.heartbeat_timeout,
        state.shutdown.clone(),
    ));

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<InboundFrame>(text.as_str()) {
                Ok(InboundFrame::Register { user_id }) => {
                    state.routing.register(user_id, Arc::clone(&connection));
                }
                Err(_) => {
                    tracing::debug!(conn_id = %conn_id, "ignoring unparseable frame");
                }
            },
            Ok(Message::Pong(_)) | Ok(Message::Ping(_)) => connection.record_pong(),
            Ok(Message::Close(_)) => break,
            // Registration is text-only; binary frames are dropped.
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(conn_id = %conn_id, %error, "notification socket error");
                break;
            }
        }
    }

    state.routing.remove_connection(conn_id);
    writer.abort();
    tracing::info!(conn_id = %conn_id, "notification client disconnected");
}

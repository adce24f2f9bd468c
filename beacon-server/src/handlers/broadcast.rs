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
use crate::ws::Connection;

/// Handle a dashboard viewer upgrade on the anonymous broadcast path.
pub async fn broadcast_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Anonymous viewer connection: joins the fan-out set on open, receives
/// every published domain event, and is removed when the socket closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(256);

    let connection = Arc::new(Connection::new(tx));
    let conn_id = connection.id;
    state.hub.add_connection(Arc::clone(&connection));
    tracing::info!(
        conn_id = %conn_id,
        viewers = state.hub.connection_count(),
        "dashboard viewer connected"
    );

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
            Ok(Message::Pong(_)) | Ok(Message::Ping(_)) => connection.record_pong(),
            Ok(Message::Close(_)) => break,
            // Viewers are receive-only; anything else they send is ignored.
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(conn_id = %conn_id, %error, "viewer socket error");
                break;
            }
        }
    }

    state.hub.remove_connection(conn_id);
    writer.abort();
    tracing::info!(conn_id = %conn_id, "dashboard viewer disconnected");
}

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::ws::Connection;

/// Writer half shared by both WebSocket endpoints.
///
/// Drains the connection's outbound channel into the socket and keeps the
/// peer alive with periodic pings. Exits when the channel closes, a write
/// fails, the pong window is exceeded, or shutdown is signalled; a close
/// frame is attempted on the way out.
pub(crate) async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Message>,
    connection: Arc<Connection>,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
    shutdown: CancellationToken,
) {
    let start = tokio::time::Instant::now() + heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(start, heartbeat_interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if !connection.is_healthy(heartbeat_timeout) {
                    tracing::info!(conn_id = %connection.id, "no pong within window; closing connection");
                    break;
                }
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sink.send(Message::Close(None)).await;
}

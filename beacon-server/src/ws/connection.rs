use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Errors from pushing a message towards a single connection.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The writer task is gone; the socket is closing or closed.
    #[error("connection closed")]
    Closed,
    /// The outbound buffer is full; the client is not keeping up.
    #[error("outbound buffer full")]
    Full,
}

/// One live WebSocket connection.
///
/// Frames are handed to a per-socket writer task over a bounded channel, so
/// fan-out never waits on a slow peer's socket.
pub struct Connection {
    /// Unique connection ID
    pub id: Uuid,
    sender: mpsc::Sender<Message>,
    /// Unix timestamp of the last pong, for connection health
    last_pong: AtomicI64,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("channel_closed", &self.sender.is_closed())
            .field("last_pong", &self.last_pong.load(Ordering::Relaxed))
            .finish()
    }
}

impl Connection {
    pub fn new(sender: mpsc::Sender<Message>) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender,
            last_pong: AtomicI64::new(chrono::Utc::now().timestamp()),
        }
    }

    /// Queue a frame for this connection without waiting.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        self.sender.try_send(message).map_err(|error| match error {
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
            mpsc::error::TrySendError::Full(_) => SendError::Full,
        })
    }

    /// Record a pong from the peer.
    pub fn record_pong(&self) {
        self.last_pong
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
    }

    /// Whether a pong arrived within the allowed window.
    pub fn is_healthy(&self, window: Duration) -> bool {
        let last = self.last_pong.load(Ordering::Relaxed);
        let now = chrono::Utc::now().timestamp();
        now - last < window.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_the_writer_side_is_gone() {
        let (tx, rx) = mpsc::channel(4);
        let connection = Connection::new(tx);
        drop(rx);

        assert!(matches!(
            connection.send(Message::Text("hello".into())),
            Err(SendError::Closed)
        ));
    }

    #[tokio::test]
    async fn send_reports_a_full_outbound_buffer() {
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);

        connection.send(Message::Text("first".into())).unwrap();
        assert!(matches!(
            connection.send(Message::Text("second".into())),
            Err(SendError::Full)
        ));
    }

    #[tokio::test]
    async fn freshly_opened_connection_is_healthy() {
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);
        assert!(connection.is_healthy(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn connection_goes_stale_without_pongs() {
        let (tx, _rx) = mpsc::channel(1);
        let connection = Connection::new(tx);
        connection.last_pong.store(
            chrono::Utc::now().timestamp() - 120,
            Ordering::Relaxed,
        );

        assert!(!connection.is_healthy(Duration::from_secs(60)));
        connection.record_pong();
        assert!(connection.is_healthy(Duration::from_secs(60)));
    }
}

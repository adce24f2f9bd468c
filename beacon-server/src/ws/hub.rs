use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::ws::connection::Connection;
use crate::ws::envelope::Envelope;

/// Fan-out set of anonymous dashboard connections.
///
/// Membership is added on connect and removed when the socket closes; there
/// is no identity and no per-connection filtering. A failed send is isolated
/// to its connection: the frame is counted as undelivered and the entry is
/// reaped by the close path of that connection's handler.
#[derive(Default)]
pub struct BroadcastHub {
    connections: DashMap<Uuid, Arc<Connection>>,
}

impl fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("connection_count", &self.connections.len())
            .finish()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection
    pub fn add_connection(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id, connection);
    }

    /// Remove a connection after its socket closed
    pub fn remove_connection(&self, conn_id: Uuid) {
        self.connections.remove(&conn_id);
    }

    /// Send one envelope to every open connection, serializing it once.
    ///
    /// Returns how many connections accepted the frame.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        let message = match envelope.to_message() {
            Ok(message) => message,
            Err(error) => {
                tracing::error!(%error, event = %envelope.event, "failed to serialize broadcast");
                return 0;
            }
        };

        let mut delivered = 0;
        for entry in self.connections.iter() {
            match entry.value().send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    // One broken or slow client never aborts the fan-out.
                    tracing::warn!(
                        %error,
                        conn_id = %entry.key(),
                        event = %envelope.event,
                        "broadcast send failed for one connection"
                    );
                }
            }
        }

        tracing::debug!(event = %envelope.event, delivered, "broadcast fan-out");
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let hub = BroadcastHub::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        hub.add_connection(Arc::new(Connection::new(tx_a)));
        hub.add_connection(Arc::new(Connection::new(tx_b)));

        let delivered = hub.broadcast(&Envelope::new("incident.alert", json!({"n": 1})));

        assert_eq!(delivered, 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn one_dead_connection_does_not_reduce_delivery_to_the_rest() {
        let hub = BroadcastHub::new();

        let (tx_dead, rx_dead) = mpsc::channel(8);
        hub.add_connection(Arc::new(Connection::new(tx_dead)));
        drop(rx_dead);

        let mut live = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(8);
            hub.add_connection(Arc::new(Connection::new(tx)));
            live.push(rx);
        }

        let delivered = hub.broadcast(&Envelope::new("status.update", json!({})));

        assert_eq!(delivered, 3);
        for rx in &mut live {
            assert!(rx.recv().await.is_some());
        }
    }

    #[tokio::test]
    async fn removed_connections_stop_receiving() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        let connection = Arc::new(Connection::new(tx));
        let conn_id = connection.id;
        hub.add_connection(connection);

        hub.remove_connection(conn_id);
        let delivered = hub.broadcast(&Envelope::new("resource.request", json!({})));

        assert_eq!(delivered, 0);
        assert_eq!(hub.connection_count(), 0);
        assert!(rx.try_recv().is_err());
    }
}

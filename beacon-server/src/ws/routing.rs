use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::ws::connection::Connection;

/// Routing table mapping a user id to its single live connection.
///
/// A new registration for the same user id replaces the previous entry
/// (last-write-wins); there is no explicit unregister. Entries disappear
/// only when the underlying connection closes. No registration expiry and no
/// authentication exist here: any client can claim any user id, a known gap
/// inherited from the wire contract.
#[derive(Default)]
pub struct RoutingTable {
    entries: DashMap<String, Arc<Connection>>,
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("registered_users", &self.entries.len())
            .finish()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `user_id` at `connection`, displacing any previous entry.
    ///
    /// Only the entry keyed by this user id is touched; registrations the
    /// same connection made under other user ids are left alone.
    pub fn register(&self, user_id: impl Into<String>, connection: Arc<Connection>) {
        let user_id = user_id.into();
        let conn_id = connection.id;
        let previous = self.entries.insert(user_id.clone(), connection);

        match previous {
            Some(old) if old.id != conn_id => {
                tracing::info!(user_id = %user_id, conn_id = %conn_id, replaced = %old.id, "registration moved to a new connection");
            }
            Some(_) => {
                tracing::debug!(user_id = %user_id, conn_id = %conn_id, "re-registration on the same connection");
            }
            None => {
                tracing::info!(user_id = %user_id, conn_id = %conn_id, "user registered");
            }
        }
    }

    /// The connection currently registered for `user_id`, if any.
    pub fn lookup(&self, user_id: &str) -> Option<Arc<Connection>> {
        self.entries.get(user_id).map(|entry| Arc::clone(&entry))
    }

    /// Reverse scan removing every entry that points at a closed connection.
    pub fn remove_connection(&self, conn_id: Uuid) {
        self.entries.retain(|_, connection| connection.id != conn_id);
    }

    pub fn registered_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn connection() -> Arc<Connection> {
        let (tx, rx) = mpsc::channel(8);
        // keep the receiver alive for the duration of the test
        std::mem::forget(rx);
        Arc::new(Connection::new(tx))
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let table = RoutingTable::new();
        let first = connection();
        let second = connection();

        table.register("userA", Arc::clone(&first));
        table.register("userA", Arc::clone(&second));

        let routed = table.lookup("userA").unwrap();
        assert_eq!(routed.id, second.id);
        assert_eq!(table.registered_count(), 1);
    }

    #[tokio::test]
    async fn registering_twice_on_the_same_connection_keeps_one_entry() {
        let table = RoutingTable::new();
        let conn = connection();

        table.register("userA", Arc::clone(&conn));
        table.register("userA", Arc::clone(&conn));

        assert_eq!(table.registered_count(), 1);
        assert_eq!(table.lookup("userA").unwrap().id, conn.id);
    }

    #[tokio::test]
    async fn close_removes_only_entries_for_that_connection() {
        let table = RoutingTable::new();
        let closing = connection();
        let surviving = connection();

        table.register("userA", Arc::clone(&closing));
        table.register("userB", Arc::clone(&closing));
        table.register("userC", Arc::clone(&surviving));

        table.remove_connection(closing.id);

        assert!(table.lookup("userA").is_none());
        assert!(table.lookup("userB").is_none());
        assert_eq!(table.lookup("userC").unwrap().id, surviving.id);
    }

    #[tokio::test]
    async fn re_registration_under_a_new_user_id_leaves_other_entries_alone() {
        let table = RoutingTable::new();
        let conn = connection();
        let other = connection();

        table.register("userA", Arc::clone(&other));
        table.register("userB", Arc::clone(&conn));
        // conn re-registers with a different user id
        table.register("userC", Arc::clone(&conn));

        assert_eq!(table.lookup("userA").unwrap().id, other.id);
        assert_eq!(table.lookup("userB").unwrap().id, conn.id);
        assert_eq!(table.lookup("userC").unwrap().id, conn.id);
    }
}

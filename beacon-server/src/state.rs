use std::fmt;
use std::sync::Arc;

use beacon_core::{Dispatcher, JobQueue, Relay};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::ws::{BroadcastHub, RoutingTable};

/// Shared handle bundle cloned into every handler and background task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: Arc<JobQueue>,
    pub relay: Arc<Relay>,
    pub dispatcher: Dispatcher,
    pub hub: Arc<BroadcastHub>,
    pub routing: Arc<RoutingTable>,
    /// Cancelled once at shutdown; pumps, workers, and socket writers all
    /// watch it.
    pub shutdown: CancellationToken,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let queue = Arc::new(JobQueue::new());
        let relay = Arc::new(Relay::new(config.relay_capacity));
        let dispatcher = Dispatcher::new(Arc::clone(&queue), Arc::clone(&relay));

        Self {
            config,
            queue,
            relay,
            dispatcher,
            hub: Arc::new(BroadcastHub::new()),
            routing: Arc::new(RoutingTable::new()),
            shutdown: CancellationToken::new(),
        }
    }
}

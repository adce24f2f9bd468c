use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::job::{Job, TaskType};
use crate::queue::JobQueue;
use crate::relay::{Relay, channels};

/// Producer-facing facade combining the relay and the job queue.
///
/// External API handlers call this after persisting a domain entity. The
/// relay publish happens first and is the immediate broadcast path; a queue
/// failure is logged and swallowed so it can never block that path.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: Arc<JobQueue>,
    relay: Arc<Relay>,
}

impl Dispatcher {
    pub fn new(queue: Arc<JobQueue>, relay: Arc<Relay>) -> Self {
        Self { queue, relay }
    }

    /// Ingest an urgent incident report: instant fan-out, then a
    /// front-of-queue job so workers pick it up ahead of the backlog.
    pub fn report_urgent(&self, reporter_id: &str, payload: Value) {
        self.relay.publish(channels::URGENT_EVENT, payload.clone());
        let job = Job::new(TaskType::Urgent, reporter_id, payload);
        if let Err(error) = self.queue.push_front(job) {
            warn!(%error, reporter_id, "urgent job not queued; broadcast already sent");
        }
    }

    /// Ingest a lower-priority resource request: fan-out, then a
    /// back-of-queue job processed in arrival order.
    pub fn request_normal(&self, reporter_id: &str, payload: Value) {
        self.relay.publish(channels::NORMAL_EVENT, payload.clone());
        let job = Job::new(TaskType::Normal, reporter_id, payload);
        if let Err(error) = self.queue.push_back(job) {
            warn!(%error, reporter_id, "normal job not queued; broadcast already sent");
        }
    }

    /// Ingest a status change. Status updates jump the queue like urgent
    /// reports so dashboards and reporters see them promptly.
    pub fn status_update(&self, reporter_id: &str, payload: Value) {
        self.relay.publish(channels::STATUS_EVENT, payload.clone());
        let job = Job::new(TaskType::StatusUpdate, reporter_id, payload);
        if let Err(error) = self.queue.push_front(job) {
            warn!(%error, reporter_id, "status job not queued; broadcast already sent");
        }
    }
}

//! Background notification workers.
//!
//! Each worker blocking-pops the shared queue, turns the job into a
//! user-facing acknowledgement, and publishes it on the targeted relay
//! channel. Any number of instances may run against the same queue; a popped
//! job belongs to exactly one of them.

use std::sync::Arc;

use beacon_core::job::{Job, Notification, TaskType};
use beacon_core::queue::JobQueue;
use beacon_core::relay::{Relay, channels};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Fixed acknowledgement text per task type; `None` means the job type
/// produces no notification.
pub fn acknowledgement_for(task_type: TaskType) -> Option<&'static str> {
    match task_type {
        TaskType::Urgent => Some(
            "Your incident report has been sent to local authorities, disaster \
             management teams, and partnered responders for immediate review and \
             action. You will receive updates as soon as a team responds.",
        ),
        TaskType::Normal => Some(
            "Your resource request has been submitted successfully. Our team will \
             review it and coordinate with the relevant agencies to fulfill your \
             needs; expect an update on availability and delivery timeline within \
             24 hours.",
        ),
        TaskType::StatusUpdate => Some(
            "The status of your report has been updated. Open your dashboard for \
             the latest details.",
        ),
        TaskType::Unknown => None,
    }
}

/// Run one worker loop until shutdown.
///
/// The pop timeout exists only so the loop notices shutdown promptly; it is
/// not a correctness mechanism. A failed job is logged and dropped, followed
/// by a fixed backoff before the loop resumes.
pub async fn run(
    worker_id: usize,
    queue: Arc<JobQueue>,
    relay: Arc<Relay>,
    config: Arc<Config>,
    shutdown: CancellationToken,
) {
    info!(worker_id, "notification worker started");

    loop {
        let popped = tokio::select! {
            _ = shutdown.cancelled() => break,
            popped = queue.blocking_pop(Some(config.worker_pop_timeout)) => popped,
        };

        let Some(job) = popped else {
            if queue.is_closed() {
                break;
            }
            continue;
        };

        debug!(
            worker_id,
            task_type = %job.task_type,
            reporter_id = %job.reporter_id,
            "picked job"
        );

        if let Err(error) = process(&relay, job) {
            error!(worker_id, %error, "job processing failed; job dropped");
            tokio::time::sleep(config.worker_backoff).await;
        }
    }

    info!(worker_id, "notification worker stopped");
}

/// Turn one popped job into a targeted notification.
///
/// Unrecognized task types are logged and skipped without an error so the
/// loop never stalls on them.
pub fn process(relay: &Relay, job: Job) -> anyhow::Result<()> {
    let Some(message) = acknowledgement_for(job.task_type) else {
        warn!(task_type = %job.task_type, "no notification for unrecognized job type; skipped");
        return Ok(());
    };

    let notification = Notification::for_job(job, message);
    let target_user_id = notification.target_user_id.clone();
    let payload = serde_json::to_value(&notification)?;
    relay.publish(channels::TARGETED_NOTIFICATION, payload);

    info!(user_id = %target_user_id, "notification published");
    Ok(())
}

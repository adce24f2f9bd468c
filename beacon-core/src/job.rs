use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a queued job.
///
/// Wire values are the snake_case strings producers send; anything else
/// deserializes to [`TaskType::Unknown`] so a bad producer cannot poison a
/// worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Urgent,
    Normal,
    StatusUpdate,
    #[serde(other)]
    Unknown,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Urgent => "urgent",
            TaskType::Normal => "normal",
            TaskType::StatusUpdate => "status_update",
            TaskType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of background work.
///
/// Immutable once created. Owned by the [`crate::queue::JobQueue`] until
/// popped; ownership transfers to whichever worker instance pops it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub task_type: TaskType,
    /// User id of the original reporter; targeted notifications are keyed
    /// by this value.
    pub reporter_id: String,
    /// Opaque domain object supplied by the producer. The pipeline never
    /// inspects it.
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        task_type: TaskType,
        reporter_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            task_type,
            reporter_id: reporter_id.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// A user-facing acknowledgement synthesized by a worker.
///
/// Transient: exists only as a relay message on the targeted-notification
/// channel, never persisted. Every notification references exactly one
/// dequeued job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub target_user_id: String,
    pub message: String,
    pub source_job: Job,
    pub processed_at: DateTime<Utc>,
}

impl Notification {
    pub fn for_job(job: Job, message: impl Into<String>) -> Self {
        Self {
            target_user_id: job.reporter_id.clone(),
            message: message.into(),
            source_job: job,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_type_round_trips_known_values() {
        for (task_type, wire) in [
            (TaskType::Urgent, "\"urgent\""),
            (TaskType::Normal, "\"normal\""),
            (TaskType::StatusUpdate, "\"status_update\""),
        ] {
            assert_eq!(serde_json::to_string(&task_type).unwrap(), wire);
            assert_eq!(serde_json::from_str::<TaskType>(wire).unwrap(), task_type);
        }
    }

    #[test]
    fn unrecognized_task_type_deserializes_to_unknown() {
        let parsed: TaskType = serde_json::from_str("\"geocode_refresh\"").unwrap();
        assert_eq!(parsed, TaskType::Unknown);
    }

    #[test]
    fn job_wire_shape_is_camel_case() {
        let job = Job::new(TaskType::Urgent, "u1", json!({"lat": 12.5}));
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["taskType"], "urgent");
        assert_eq!(value["reporterId"], "u1");
        assert_eq!(value["payload"]["lat"], 12.5);
        assert!(value["enqueuedAt"].is_string());
    }

    #[test]
    fn notification_targets_the_job_reporter() {
        let job = Job::new(TaskType::Normal, "u7", json!({}));
        let notification = Notification::for_job(job, "submitted");

        assert_eq!(notification.target_user_id, "u7");
        assert_eq!(notification.source_job.reporter_id, "u7");

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["targetUserId"], "u7");
        assert_eq!(value["sourceJob"]["reporterId"], "u7");
        assert!(value["processedAt"].is_string());
    }
}

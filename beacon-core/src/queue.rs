use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::job::Job;

/// Errors surfaced by queue producers.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue was closed during shutdown; no further pushes are accepted.
    #[error("job queue is closed")]
    Closed,
}

/// Shared, two-ended job queue with a single consumption end.
///
/// Urgent jobs are pushed to the front and normal jobs to the back; consumers
/// always pop from the front. That single discipline gives strict priority
/// ordering with O(1) operations and no separate priority structure: any job
/// pushed to the front dequeues before every job that was already sitting at
/// the back, and back-of-queue jobs stay FIFO among themselves.
///
/// Callers never see both ends directly; the only operations are
/// [`push_front`](JobQueue::push_front), [`push_back`](JobQueue::push_back),
/// and [`blocking_pop`](JobQueue::blocking_pop). Pops are atomic across
/// concurrent consumers: each job is claimed by exactly one.
#[derive(Debug, Default)]
pub struct JobQueue {
    inner: Mutex<VecDeque<Job>>,
    notify: Notify,
    closed: AtomicBool,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a job so it is consumed ahead of everything already queued.
    pub fn push_front(&self, job: Job) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        self.inner.lock().push_front(job);
        self.notify.notify_one();
        Ok(())
    }

    /// Append a job behind everything already queued.
    pub fn push_back(&self, job: Job) -> Result<(), QueueError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueError::Closed);
        }
        self.inner.lock().push_back(job);
        self.notify.notify_one();
        Ok(())
    }

    /// Pop the next job from the consumption end, suspending until one is
    /// available or `timeout` elapses.
    ///
    /// `None` timeout blocks indefinitely. A timeout expiry returns `None`,
    /// never an error. After [`close`](JobQueue::close), remaining jobs are
    /// still drained; once empty every waiter returns `None`.
    pub async fn blocking_pop(&self, timeout: Option<Duration>) -> Option<Job> {
        let deadline = timeout.map(|t| tokio::time::Instant::now() + t);

        loop {
            let mut notified = pin!(self.notify.notified());
            // Register the waiter before the emptiness check so a push that
            // lands in between is observed by the re-check or the wakeup.
            notified.as_mut().enable();

            if let Some(job) = self.inner.lock().pop_front() {
                return Some(job);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            match deadline {
                None => notified.await,
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        // Timed out: one last non-blocking attempt so a push
                        // racing the expiry is not left behind.
                        return self.inner.lock().pop_front();
                    }
                }
            }
        }
    }

    /// Stop accepting pushes and wake every blocked consumer.
    ///
    /// Already-queued jobs remain poppable so shutdown can drain them.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

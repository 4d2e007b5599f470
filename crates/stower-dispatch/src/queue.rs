//! Bounded FIFO channel of pending copy jobs.
//!
//! Producers (request handlers) only ever attempt a non-blocking enqueue;
//! the single consumer awaits jobs in acceptance order. Capacity is fixed
//! when the queue is created.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::EnqueueError;
use crate::job::CopyJob;

/// Producer half of the copy-job queue; cheap to clone into handlers.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<CopyJob>,
    capacity: usize,
}

/// Consumer half of the copy-job queue, held by the worker alone.
pub struct JobReceiver {
    receiver: mpsc::Receiver<CopyJob>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, JobReceiver) {
        assert!(capacity > 0, "job queue capacity must be positive");
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, JobReceiver { receiver })
    }

    /// Offer a job to the queue without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] immediately when the queue is at
    /// capacity and [`EnqueueError::Closed`] once the consumer has gone
    /// away; the job is handed back in both cases.
    pub fn enqueue(&self, job: CopyJob) -> Result<(), EnqueueError> {
        self.sender.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) => EnqueueError::Full { job: Box::new(job) },
            TrySendError::Closed(job) => EnqueueError::Closed { job: Box::new(job) },
        })
    }

    /// Number of jobs currently waiting.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Fixed capacity configured at startup.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl JobReceiver {
    /// Await the next job in acceptance order.
    ///
    /// Returns `None` once every producer handle has been dropped and the
    /// backlog is drained, which is the worker's shutdown signal.
    pub async fn dequeue(&mut self) -> Option<CopyJob> {
        self.receiver.recv().await
    }

    /// Number of jobs still waiting behind the one being processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

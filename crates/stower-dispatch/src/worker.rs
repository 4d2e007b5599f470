//! The single copy worker.
//!
//! Exactly one worker drains the queue, so jobs execute strictly one at a
//! time in acceptance order. That serialisation is what guarantees at most
//! one active copy per destination without any per-key locking. A slow copy
//! therefore delays everything queued behind it, which is the accepted
//! trade-off here.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stower_events::{Event, EventBus};
use stower_fsops::replicate;
use stower_telemetry::Metrics;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::job::CopyJob;
use crate::queue::JobReceiver;

/// Outcome of one processed copy job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The tree was fully replicated at the destination.
    Succeeded,
    /// The destination already existed; no filesystem writes were made.
    Skipped,
    /// The copy aborted; the destination may be partially populated.
    Failed {
        /// Failure detail for diagnostics.
        message: String,
    },
}

impl CopyOutcome {
    /// Label used for logs and the `copy_jobs_total` metric.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Long-lived consumer that owns all filesystem-mutating work.
pub struct CopyWorker {
    events: EventBus,
    metrics: Metrics,
}

impl CopyWorker {
    /// Construct a worker that reports through the shared bus and metrics.
    #[must_use]
    pub const fn new(events: EventBus, metrics: Metrics) -> Self {
        Self { events, metrics }
    }

    /// Spawn the drain loop.
    ///
    /// The task runs until the queue is closed and its backlog drained; a
    /// job that has been dequeued always runs to completion.
    #[must_use]
    pub fn spawn(self, mut jobs: JobReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("copy worker started");
            while let Some(job) = jobs.dequeue().await {
                self.metrics.set_queue_depth(jobs.pending());
                self.process(job).await;
            }
            info!("copy worker drained the queue and stopped");
        })
    }

    async fn process(&self, job: CopyJob) {
        let _ = self.events.publish(Event::CopyStarted {
            notice_id: job.notice_id,
            content_id: job.content_id().to_string(),
        });
        info!(
            notice_id = %job.notice_id,
            content_id = %job.content_id(),
            source = %job.source.display(),
            destination = %job.destination.display(),
            "copy job started"
        );

        let outcome = run_copy(job.source.clone(), job.destination.clone()).await;
        self.report(&job, &outcome);
    }

    fn report(&self, job: &CopyJob, outcome: &CopyOutcome) {
        self.metrics.inc_copy_outcome(outcome.as_str());
        match outcome {
            CopyOutcome::Succeeded => {
                let _ = self.events.publish(Event::CopyCompleted {
                    notice_id: job.notice_id,
                    content_id: job.content_id().to_string(),
                    destination: job.destination.display().to_string(),
                });
                info!(
                    notice_id = %job.notice_id,
                    content_id = %job.content_id(),
                    destination = %job.destination.display(),
                    "copy job succeeded"
                );
            }
            CopyOutcome::Skipped => {
                let _ = self.events.publish(Event::CopySkipped {
                    notice_id: job.notice_id,
                    content_id: job.content_id().to_string(),
                });
                info!(
                    notice_id = %job.notice_id,
                    content_id = %job.content_id(),
                    "destination already exists; copy skipped"
                );
            }
            CopyOutcome::Failed { message } => {
                let _ = self.events.publish(Event::CopyFailed {
                    notice_id: job.notice_id,
                    content_id: job.content_id().to_string(),
                    message: message.clone(),
                });
                warn!(
                    notice_id = %job.notice_id,
                    content_id = %job.content_id(),
                    error = %message,
                    "copy job failed"
                );
            }
        }
    }
}

async fn run_copy(source: PathBuf, destination: PathBuf) -> CopyOutcome {
    let handle = tokio::task::spawn_blocking(move || execute(&source, &destination));
    match handle.await {
        Ok(outcome) => outcome,
        Err(join_err) => CopyOutcome::Failed {
            message: join_err.to_string(),
        },
    }
}

fn execute(source: &Path, destination: &Path) -> CopyOutcome {
    match fs::metadata(destination) {
        Ok(_) => CopyOutcome::Skipped,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            match replicate(source, destination) {
                Ok(()) => CopyOutcome::Succeeded,
                Err(err) => CopyOutcome::Failed {
                    message: error_chain(&err),
                },
            }
        }
        Err(err) => CopyOutcome::Failed {
            message: format!("destination stat failed: {err}"),
        },
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(current) = cause {
        message.push_str(": ");
        message.push_str(&current.to_string());
        cause = current.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{CompletionNotice, CopyRoots};
    use crate::queue::JobQueue;
    use anyhow::Result;
    use chrono::Utc;
    use std::time::Duration;
    use stower_events::EventStream;
    use tempfile::TempDir;
    use tokio::time::timeout;

    fn roots(temp: &TempDir) -> CopyRoots {
        CopyRoots {
            source_root: temp.path().join("torrents"),
            library_root: temp.path().join("complete"),
        }
    }

    fn notice(identifier: &str) -> CompletionNotice {
        CompletionNotice {
            metainfo: identifier.to_string(),
            name: identifier.to_string(),
            state: "done".to_string(),
            time: Utc::now(),
        }
    }

    async fn collect_events(stream: &mut EventStream, count: usize) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..count {
            match timeout(Duration::from_secs(2), stream.next()).await {
                Ok(Some(envelope)) => events.push(envelope.event),
                _ => break,
            }
        }
        events
    }

    #[tokio::test]
    async fn worker_copies_then_skips_resubmission() -> Result<()> {
        let temp = TempDir::new()?;
        let roots = roots(&temp);
        let source_dir = roots.source_root.join("abc123");
        fs::create_dir_all(source_dir.join("sub"))?;
        fs::write(source_dir.join("file1.txt"), b"one")?;
        fs::write(source_dir.join("sub").join("file2.txt"), b"two")?;

        let bus = EventBus::with_capacity(32);
        let metrics = Metrics::new()?;
        let mut stream = bus.subscribe();
        let (queue, receiver) = JobQueue::bounded(4);
        let handle = CopyWorker::new(bus.clone(), metrics).spawn(receiver);

        let first = CopyJob::build(notice("abc123"), &roots)?;
        let second = CopyJob::build(notice("abc123"), &roots)?;
        queue.enqueue(first).expect("room for first");
        queue.enqueue(second).expect("room for second");
        drop(queue);
        handle.await?;

        let destination = roots.library_root.join("abc123");
        assert_eq!(fs::read(destination.join("file1.txt"))?, b"one");
        assert_eq!(fs::read(destination.join("sub").join("file2.txt"))?, b"two");

        let events = collect_events(&mut stream, 4).await;
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            ["copy_started", "copy_completed", "copy_started", "copy_skipped"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn skipped_job_leaves_the_destination_untouched() -> Result<()> {
        let temp = TempDir::new()?;
        let roots = roots(&temp);
        fs::create_dir_all(roots.source_root.join("seen"))?;
        fs::write(roots.source_root.join("seen").join("new.txt"), b"new")?;
        let destination = roots.library_root.join("seen");
        fs::create_dir_all(&destination)?;
        fs::write(destination.join("old.txt"), b"old")?;

        let bus = EventBus::with_capacity(8);
        let (queue, receiver) = JobQueue::bounded(2);
        let handle = CopyWorker::new(bus, Metrics::new()?).spawn(receiver);
        queue.enqueue(CopyJob::build(notice("seen"), &roots)?).expect("room");
        drop(queue);
        handle.await?;

        assert_eq!(fs::read(destination.join("old.txt"))?, b"old");
        assert!(
            !destination.join("new.txt").exists(),
            "skip must not copy anything"
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_source_reports_failure_and_worker_moves_on() -> Result<()> {
        let temp = TempDir::new()?;
        let roots = roots(&temp);
        fs::create_dir_all(roots.source_root.join("present"))?;
        fs::write(roots.source_root.join("present").join("ok.txt"), b"ok")?;

        let bus = EventBus::with_capacity(16);
        let metrics = Metrics::new()?;
        let mut stream = bus.subscribe();
        let (queue, receiver) = JobQueue::bounded(4);
        let handle = CopyWorker::new(bus.clone(), metrics.clone()).spawn(receiver);

        queue.enqueue(CopyJob::build(notice("absent"), &roots)?).expect("room");
        queue.enqueue(CopyJob::build(notice("present"), &roots)?).expect("room");
        drop(queue);
        handle.await?;

        let events = collect_events(&mut stream, 4).await;
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            ["copy_started", "copy_failed", "copy_started", "copy_completed"]
        );
        assert!(
            roots.library_root.join("present").join("ok.txt").exists(),
            "a failure must not stall later jobs"
        );

        let rendered = metrics.render()?;
        assert!(rendered.contains(r#"copy_jobs_total{outcome="failed"} 1"#));
        assert!(rendered.contains(r#"copy_jobs_total{outcome="succeeded"} 1"#));
        Ok(())
    }

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(CopyOutcome::Succeeded.as_str(), "succeeded");
        assert_eq!(CopyOutcome::Skipped.as_str(), "skipped");
        assert_eq!(
            CopyOutcome::Failed {
                message: "boom".to_string()
            }
            .as_str(),
            "failed"
        );
    }
}

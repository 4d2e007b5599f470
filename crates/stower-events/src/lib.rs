//! Core event bus for the Stower service.
//!
//! The bus provides a typed event enum and sequential identifiers so that
//! admission and the copy worker can surface lifecycle outcomes to any
//! in-process subscriber. Internally it uses `tokio::broadcast` with a
//! bounded buffer; when the channel overflows, the oldest events are
//! dropped, matching the desired backpressure behaviour.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Identifier assigned to each event emitted by the service.
pub type EventId = u64;

/// Default broadcast buffer size.
const DEFAULT_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A completion notice passed validation and was queued for copying.
    NoticeAccepted {
        /// Correlation id assigned at admission.
        notice_id: Uuid,
        /// Content identifier named by the caller.
        content_id: String,
        /// Display name supplied with the notice.
        name: String,
    },
    /// A completion notice was turned away before any work was queued.
    NoticeRejected {
        /// Content identifier named by the caller (possibly invalid).
        content_id: String,
        /// Machine-readable rejection reason.
        reason: String,
    },
    /// The worker picked up a job and began copying.
    CopyStarted {
        /// Correlation id assigned at admission.
        notice_id: Uuid,
        /// Content identifier being copied.
        content_id: String,
    },
    /// The destination already existed; no filesystem writes were made.
    CopySkipped {
        /// Correlation id assigned at admission.
        notice_id: Uuid,
        /// Content identifier that was skipped.
        content_id: String,
    },
    /// The tree was fully replicated at the destination.
    CopyCompleted {
        /// Correlation id assigned at admission.
        notice_id: Uuid,
        /// Content identifier that was copied.
        content_id: String,
        /// Absolute destination path of the copy.
        destination: String,
    },
    /// The copy aborted; the destination may be partially populated.
    CopyFailed {
        /// Correlation id assigned at admission.
        notice_id: Uuid,
        /// Content identifier whose copy failed.
        content_id: String,
        /// Failure detail for diagnostics.
        message: String,
    },
    /// Component degradation state changed.
    HealthChanged {
        /// Names of currently degraded components; empty when recovered.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator for log and metric consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoticeAccepted { .. } => "notice_accepted",
            Self::NoticeRejected { .. } => "notice_rejected",
            Self::CopyStarted { .. } => "copy_started",
            Self::CopySkipped { .. } => "copy_skipped",
            Self::CopyCompleted { .. } => "copy_completed",
            Self::CopyFailed { .. } => "copy_failed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned at publication.
    pub id: EventId,
    /// Wall-clock time the event was published.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Construct a bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Publish a new event to the bus, assigning it a sequential identifier.
    ///
    /// Events published while no subscriber is attached are dropped.
    #[must_use]
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events from the live broadcast channel.
pub struct EventStream {
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, skipping over any lagged gap.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => self.receiver.recv().await.ok(),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;

    const PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

    fn sample_event(id: usize) -> Event {
        Event::CopyCompleted {
            notice_id: Uuid::from_u128(id as u128 + 1),
            content_id: format!("hash-{id}"),
            destination: format!("/library/hash-{id}"),
        }
    }

    #[tokio::test]
    async fn sequential_ids_in_publish_order() {
        let bus = EventBus::with_capacity(16);
        let mut stream = bus.subscribe();

        let mut last_id = 0;
        for i in 0..5 {
            last_id = bus.publish(sample_event(i));
        }
        assert_eq!(last_id, 5);

        let mut received = Vec::new();
        for _ in 0..5 {
            if let Some(envelope) = stream.next().await {
                received.push(envelope);
            }
        }
        assert_eq!(received.len(), 5);
        assert_eq!(received.first().map(|envelope| envelope.id), Some(1));
        assert_eq!(received.last().map(|envelope| envelope.id), Some(5));
    }

    #[test]
    fn event_kind_is_stable() {
        let event = Event::NoticeRejected {
            content_id: String::new(),
            reason: "empty_identifier".to_string(),
        };
        assert_eq!(event.kind(), "notice_rejected");
        assert_eq!(
            Event::HealthChanged { degraded: vec![] }.kind(),
            "health_changed"
        );
    }

    #[tokio::test]
    async fn load_test_does_not_stall_publishers() {
        let bus = Arc::new(EventBus::with_capacity(512));
        let mut stream = bus.subscribe();

        let publisher = {
            let bus = Arc::clone(&bus);
            task::spawn(async move {
                for i in 0..500 {
                    let publish_bus = Arc::clone(&bus);
                    timeout(PUBLISH_TIMEOUT, async move {
                        let _ = publish_bus.publish(sample_event(i));
                    })
                    .await
                    .expect("publish timed out");
                }
            })
        };

        let consumer = task::spawn(async move {
            let mut ids = HashSet::new();
            while ids.len() < 500 {
                if let Some(event) = stream.next().await {
                    ids.insert(event.id);
                }
            }
            ids
        });

        publisher.await.expect("publisher task panicked");
        let ids = consumer.await.expect("consumer task panicked");
        assert_eq!(ids.len(), 500);
    }
}

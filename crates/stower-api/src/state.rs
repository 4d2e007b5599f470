//! Shared handler state.

use stower_dispatch::{CopyRoots, JobQueue};
use stower_events::EventBus;
use stower_telemetry::Metrics;

/// Dependencies shared by every request handler.
pub(crate) struct ApiState {
    /// Producer half of the copy-job queue.
    pub(crate) queue: JobQueue,
    /// Filesystem roots jobs resolve their paths against.
    pub(crate) roots: CopyRoots,
    /// Bus used to surface admission outcomes.
    pub(crate) events: EventBus,
    /// Shared metrics registry.
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) const fn new(
        queue: JobQueue,
        roots: CopyRoots,
        events: EventBus,
        telemetry: Metrics,
    ) -> Self {
        Self {
            queue,
            roots,
            events,
            telemetry,
        }
    }
}

//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the minimal set of counters/gauges the dispatch pipeline needs.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{TelemetryError, TelemetryResult};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    notices_total: IntCounterVec,
    copy_jobs_total: IntCounterVec,
    queue_depth: IntGauge,
    queue_rejections_total: IntCounter,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built
    /// or registered.
    pub fn new() -> TelemetryResult<Self> {
        let registry = Registry::new();

        let notices_total = IntCounterVec::new(
            Opts::new("notices_total", "Completion notices received by status"),
            &["status"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "notices_total",
            source,
        })?;
        let copy_jobs_total = IntCounterVec::new(
            Opts::new("copy_jobs_total", "Copy jobs processed by outcome"),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "copy_jobs_total",
            source,
        })?;
        let queue_depth = IntGauge::with_opts(Opts::new(
            "queue_depth",
            "Copy jobs currently waiting in the queue",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "queue_depth",
            source,
        })?;
        let queue_rejections_total = IntCounter::with_opts(Opts::new(
            "queue_rejections_total",
            "Notices turned away because the queue was full",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "queue_rejections_total",
            source,
        })?;

        register(&registry, "notices_total", notices_total.clone())?;
        register(&registry, "copy_jobs_total", copy_jobs_total.clone())?;
        register(&registry, "queue_depth", queue_depth.clone())?;
        register(
            &registry,
            "queue_rejections_total",
            queue_rejections_total.clone(),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                notices_total,
                copy_jobs_total,
                queue_depth,
                queue_rejections_total,
            }),
        })
    }

    /// Count a completion notice by admission status.
    pub fn inc_notice(&self, status: &str) {
        self.inner.notices_total.with_label_values(&[status]).inc();
    }

    /// Count a finished copy job by outcome label.
    pub fn inc_copy_outcome(&self, outcome: &str) {
        self.inner
            .copy_jobs_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record the current number of queued copy jobs.
    pub fn set_queue_depth(&self, depth: usize) {
        self.inner
            .queue_depth
            .set(i64::try_from(depth).unwrap_or(i64::MAX));
    }

    /// Count a notice shed because the queue was full.
    pub fn inc_queue_rejection(&self) {
        self.inner.queue_rejections_total.inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn render(&self) -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn register(
    registry: &Registry,
    name: &'static str,
    collector: impl prometheus::core::Collector + 'static,
) -> TelemetryResult<()> {
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

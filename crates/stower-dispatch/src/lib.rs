//! Asynchronous copy-job dispatch pipeline.
//!
//! Admission builds a [`CopyJob`] from an inbound [`CompletionNotice`] and
//! offers it to the bounded [`JobQueue`] without blocking; a single
//! [`CopyWorker`] drains the queue and performs the idempotent tree copy.
//! The queue is the sole admission-control mechanism: when it is full, new
//! notices are rejected immediately rather than buffered or blocked.
//!
//! Layout: `job.rs` (notice/job model and identifier hardening), `queue.rs`
//! (bounded FIFO channel), `worker.rs` (the drain loop), `error.rs`.
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

mod error;
mod job;
mod queue;
mod worker;

pub use error::{AdmissionError, AdmissionResult, EnqueueError};
pub use job::{CompletionNotice, CopyJob, CopyRoots};
pub use queue::{JobQueue, JobReceiver};
pub use worker::{CopyOutcome, CopyWorker};

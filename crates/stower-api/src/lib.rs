//! HTTP surface for the Stower service.
//!
//! Admission is the only outward-facing operation: `POST /complete` accepts
//! a completion notice, attempts a non-blocking enqueue, and answers
//! immediately. `GET /health` and `GET /metrics` expose queue occupancy and
//! the Prometheus registry.
//!
//! Layout: `http/` (router and handlers), `state.rs` (shared handler
//! state), `error.rs` (server bootstrap errors).
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
mod http;
mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;

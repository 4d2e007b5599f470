//! Settings loading and validation for the Stower service.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (compiled defaults),
//! `loader.rs` (file + environment sources), `validate.rs` (startup checks).
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

/// Compiled default values.
pub mod defaults;
mod error;
mod loader;
mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{LogFormatSetting, LogSettings, Settings};

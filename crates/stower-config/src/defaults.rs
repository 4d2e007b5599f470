//! Compiled default values applied before file and environment sources.

use std::net::{IpAddr, Ipv4Addr};

/// Friendly identifier recorded in logs.
pub const DEFAULT_INSTANCE_NAME: &str = "stower";

/// Address the HTTP listener binds to.
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Port the HTTP listener binds to.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Staging root that finished payloads are read from.
pub const DEFAULT_SOURCE_ROOT: &str = "/data/torrents";

/// Library root that finished payloads are copied into.
pub const DEFAULT_LIBRARY_ROOT: &str = "/data/complete";

/// Number of copy jobs the queue holds before shedding load.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

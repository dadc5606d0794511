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

//! Telemetry primitives for the Lockwarden daemon.
//!
//! Layout: `init.rs` (logging setup), `error.rs` (error types).

/// Error types for telemetry operations.
pub mod error;
/// Logging initialisation.
pub mod init;

pub use error::TelemetryError;
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};

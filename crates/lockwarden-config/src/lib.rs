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

//! Settings model and TOML loader for the Lockwarden daemon.
//!
//! Layout: `model.rs` (typed settings and validation), `loader.rs` (file
//! loading), `error.rs` (error types).

/// Error types for configuration operations.
pub mod error;
/// TOML file loading.
pub mod loader;
/// Typed settings model.
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use model::{ApiSettings, DaemonSettings, LockSettings, Settings, WatchSettings};

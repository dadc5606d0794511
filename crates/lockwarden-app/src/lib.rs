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

//! Lockwarden daemon bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (dependency wiring and the boot sequence),
//! `supervisor.rs` (restart supervision), `error.rs` (error types).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Error types for application operations.
pub mod error;
/// Restart supervision for the watch pipeline.
pub mod supervisor;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
pub use supervisor::Supervisor;

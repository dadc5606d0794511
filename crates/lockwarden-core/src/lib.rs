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

//! Core pipeline for the Lockwarden WORM-lock daemon.
//!
//! Layout: `storage.rs` (collaborator contracts and wire types),
//! `retention.rs` (date-grammar parser), `resolve.rs` (target resolution),
//! `lock.rs` (dedup + retry orchestration), `watch.rs` (change-notification
//! consumption), `paths.rs` (path normalisation).

/// Error types for core pipeline operations.
pub mod error;
/// Lock orchestration with cooldown dedup and bounded retry.
pub mod lock;
/// Absolute-path normalisation helpers.
pub mod paths;
/// Monitored-target resolution.
pub mod resolve;
/// Retention date grammar.
pub mod retention;
/// Storage collaborator contracts.
pub mod storage;
/// Change-notification consumer.
pub mod watch;

pub use error::{LockError, ResolveError, RetentionError, StorageError, WatchError};
pub use lock::{FailReason, LockOrchestrator, LockOutcome, LockPolicy, SkipReason};
pub use resolve::{MonitoredTarget, resolve_target};
pub use retention::{RetentionSpec, format_retention};
pub use storage::{ChangeStream, EventKind, FileAttributes, FileRef, FileType, StorageApi};
pub use watch::{ConsumerSettings, NotificationConsumer};

//! # Design
//!
//! - Centralize error types for the core pipeline crates.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Collaborator faults cross the trait boundary as `StorageError` so the
//!   core never depends on a concrete transport.

use thiserror::Error;

/// Faults raised by the storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("transport failure")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Human-readable failure detail.
        detail: String,
    },
    /// The cluster rejected the session credentials.
    #[error("authentication rejected")]
    Auth {
        /// Human-readable failure detail.
        detail: String,
    },
    /// The cluster returned a non-success status.
    #[error("unexpected response status")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status code returned by the cluster.
        status: u16,
    },
    /// The referenced object does not exist.
    #[error("object not found")]
    NotFound {
        /// Reference that failed to resolve.
        reference: String,
    },
    /// A response payload could not be decoded.
    #[error("malformed response payload")]
    Protocol {
        /// Operation identifier.
        operation: &'static str,
        /// Human-readable failure detail.
        detail: String,
    },
}

/// Rejection of a retention specification string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetentionError {
    /// The magnitude before a `d`/`m`/`y` suffix was not an integer.
    #[error("invalid retention magnitude")]
    InvalidMagnitude {
        /// Specification string supplied by the caller.
        value: String,
    },
    /// The specification matched none of the grammar rules.
    #[error("unrecognised retention specification")]
    UnrecognisedSpec {
        /// Specification string supplied by the caller.
        value: String,
    },
    /// The resolved deadline exceeds the representable time range.
    #[error("retention deadline out of range")]
    OutOfRange {
        /// Specification that produced the unrepresentable deadline.
        value: String,
    },
}

/// Failure to resolve a monitored target.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The cluster reported the referenced object missing.
    #[error("monitored target does not exist")]
    Missing {
        /// Reference that failed to resolve.
        reference: String,
    },
    /// The attribute lookup faulted.
    #[error("target attribute lookup failed")]
    Lookup {
        /// Reference that failed to resolve.
        reference: String,
        /// Source collaborator fault.
        source: StorageError,
    },
}

/// Rejection of a single lock request before any RPC is issued.
#[derive(Debug, Error)]
pub enum LockError {
    /// The target path was not absolute.
    #[error("lock target path is not absolute")]
    RelativePath {
        /// Path supplied by the caller.
        path: String,
    },
}

/// Failure of a notification consumption cycle.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The change stream faulted.
    #[error("change stream failed")]
    Stream {
        /// Source collaborator fault.
        source: StorageError,
    },
    /// The change stream ended without a fault.
    #[error("change stream ended unexpectedly")]
    StreamClosed,
}

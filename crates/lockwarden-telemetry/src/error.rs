//! Error types for telemetry operations.

use thiserror::Error;

/// Primary error type for telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The global tracing subscriber could not be installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Human-readable failure detail.
        detail: String,
    },
}

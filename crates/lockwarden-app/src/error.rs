//! # Design
//!
//! - Centralize application-level errors for bootstrap and supervision.
//! - Keep error messages constant while carrying context fields for
//!   debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration was missing.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: &'static str,
    },
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: lockwarden_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: lockwarden_telemetry::TelemetryError,
    },
    /// Storage collaborator operations failed.
    #[error("storage operation failed")]
    Client {
        /// Operation identifier.
        operation: &'static str,
        /// Source storage error.
        source: lockwarden_core::StorageError,
    },
    /// The watch target could not be resolved.
    #[error("watch target resolution failed")]
    Resolve {
        /// Source resolve error.
        source: lockwarden_core::ResolveError,
    },
    /// The notification stream faulted or closed.
    #[error("notification stream failed")]
    Watch {
        /// Source watch error.
        source: lockwarden_core::WatchError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: lockwarden_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: lockwarden_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn client(
        operation: &'static str,
        source: lockwarden_core::StorageError,
    ) -> Self {
        Self::Client { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_helpers_build_variants() {
        let config = AppError::config(
            "settings.load",
            lockwarden_config::ConfigError::InvalidField {
                section: "watch",
                field: "events",
                reason: "empty",
            },
        );
        assert!(matches!(config, AppError::Config { .. }));

        let telemetry = AppError::telemetry(
            "telemetry.init",
            lockwarden_telemetry::TelemetryError::SubscriberInstall {
                detail: "already installed".into(),
            },
        );
        assert!(matches!(telemetry, AppError::Telemetry { .. }));

        let client = AppError::client(
            "session.login",
            lockwarden_core::StorageError::Auth {
                detail: "rejected".into(),
            },
        );
        assert!(matches!(client, AppError::Client { .. }));
    }
}

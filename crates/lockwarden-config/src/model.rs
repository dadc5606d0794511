//! Typed settings model.
//!
//! # Design
//! - Pure data carriers deserialized from the daemon's TOML file.
//! - Validation lives next to the model so the loader stays IO-only.
//! - Interval fields deserialize as whole seconds to match the original
//!   operator-facing configuration surface.

use std::path::PathBuf;
use std::time::Duration;

use lockwarden_core::storage::{EventKind, FileRef};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Top-level daemon settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Cluster API connection settings.
    pub api: ApiSettings,
    /// Watch target and consumer settings.
    pub watch: WatchSettings,
    /// Lock policy settings.
    #[serde(default)]
    pub lock: LockSettings,
    /// Supervisor settings.
    #[serde(default)]
    pub daemon: DaemonSettings,
}

/// Cluster API connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    /// Cluster hostname.
    pub host: String,
    /// Cluster API port.
    pub port: u16,
    /// Session username.
    pub username: String,
    /// Session secret.
    pub password: String,
    /// Accept self-signed cluster certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Watch target and consumer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSettings {
    /// Opaque identifier of the watched object.
    #[serde(default)]
    pub file_id: Option<String>,
    /// Absolute path of the watched object.
    #[serde(default)]
    pub directory_path: Option<String>,
    /// Watch the whole subtree rather than direct children.
    #[serde(default)]
    pub recursive: bool,
    /// Event kinds that trigger a lock attempt.
    #[serde(default = "default_events")]
    pub events: Vec<EventKind>,
    /// Seconds to let writes settle before locking.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
}

/// Lock policy settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockSettings {
    /// Retention specification (`7d`, `2m`, `1y`, or `YYYY-MM-DD`).
    #[serde(default)]
    pub retention: Option<String>,
    /// Place an indefinite legal hold on locked files.
    #[serde(default)]
    pub legal_hold: bool,
    /// Minimum seconds between lock attempts on one path.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Total lock RPC attempts per event.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed seconds between lock RPC attempts.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            retention: None,
            legal_hold: false,
            cooldown_secs: default_cooldown(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

/// Supervisor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSettings {
    /// Fixed seconds between restart cycles after a fault.
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,
    /// Optional file receiving a timestamped line per successful lock.
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            restart_delay_secs: default_restart_delay(),
            output_file: None,
        }
    }
}

const fn default_settle_delay() -> u64 {
    15
}

const fn default_cooldown() -> u64 {
    5
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    2
}

const fn default_restart_delay() -> u64 {
    5
}

fn default_events() -> Vec<EventKind> {
    vec![EventKind::FileAdded]
}

impl Settings {
    /// Validate cross-field constraints after deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] on the first violated
    /// constraint.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.host.trim().is_empty() {
            return Err(invalid("api", "host", "empty"));
        }
        if self.api.username.trim().is_empty() {
            return Err(invalid("api", "username", "empty"));
        }
        match (&self.watch.file_id, &self.watch.directory_path) {
            (None, None) => return Err(invalid("watch", "file_id", "missing_target")),
            (Some(_), Some(_)) => {
                return Err(invalid("watch", "directory_path", "ambiguous_target"));
            }
            (Some(id), None) if id.trim().is_empty() => {
                return Err(invalid("watch", "file_id", "empty"));
            }
            (None, Some(path)) if !path.starts_with('/') => {
                return Err(invalid("watch", "directory_path", "not_absolute"));
            }
            _ => {}
        }
        if self.watch.events.is_empty() {
            return Err(invalid("watch", "events", "empty"));
        }
        if self.lock.max_attempts == 0 {
            return Err(invalid("lock", "max_attempts", "zero"));
        }
        Ok(())
    }

    /// The configured watch reference; call only after [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when neither target form is
    /// present.
    pub fn target_ref(&self) -> ConfigResult<FileRef> {
        if let Some(id) = &self.watch.file_id {
            return Ok(FileRef::Id(id.clone()));
        }
        if let Some(path) = &self.watch.directory_path {
            return Ok(FileRef::Path(path.clone()));
        }
        Err(invalid("watch", "file_id", "missing_target"))
    }
}

impl WatchSettings {
    /// Settling delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

impl LockSettings {
    /// Cooldown window as a [`Duration`].
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Retry pause as a [`Duration`].
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl DaemonSettings {
    /// Restart pause as a [`Duration`].
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

const fn invalid(
    section: &'static str,
    field: &'static str,
    reason: &'static str,
) -> ConfigError {
    ConfigError::InvalidField {
        section,
        field,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn minimal_toml() -> &'static str {
        r#"
            [api]
            host = "cluster.example.com"
            port = 8000
            username = "svc-lock"
            password = "secret"

            [watch]
            directory_path = "/vault/docs"
            recursive = true
        "#
    }

    #[test]
    fn minimal_settings_apply_documented_defaults() -> Result<()> {
        let settings: Settings = toml::from_str(minimal_toml())?;
        settings.validate()?;
        assert_eq!(settings.watch.settle_delay(), Duration::from_secs(15));
        assert_eq!(settings.watch.events, vec![EventKind::FileAdded]);
        assert_eq!(settings.lock.cooldown(), Duration::from_secs(5));
        assert_eq!(settings.lock.max_attempts, 3);
        assert_eq!(settings.lock.retry_delay(), Duration::from_secs(2));
        assert_eq!(settings.daemon.restart_delay(), Duration::from_secs(5));
        assert!(settings.daemon.output_file.is_none());
        assert_eq!(
            settings.target_ref()?,
            FileRef::Path("/vault/docs".into())
        );
        Ok(())
    }

    #[test]
    fn event_aliases_parse_in_config_files() -> Result<()> {
        let raw = r#"
            [api]
            host = "h"
            port = 8000
            username = "u"
            password = "p"

            [watch]
            file_id = "10123"
            events = ["file_added", "acl_changed"]
        "#;
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        assert_eq!(
            settings.watch.events,
            vec![EventKind::FileAdded, EventKind::AclChanged]
        );
        assert_eq!(settings.target_ref()?, FileRef::Id("10123".into()));
        Ok(())
    }

    #[test]
    fn both_target_forms_are_rejected() -> Result<()> {
        let mut settings: Settings = toml::from_str(minimal_toml())?;
        settings.watch.file_id = Some("10123".into());
        let result = settings.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                reason: "ambiguous_target",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn missing_target_is_rejected() -> Result<()> {
        let mut settings: Settings = toml::from_str(minimal_toml())?;
        settings.watch.directory_path = None;
        assert!(settings.validate().is_err());
        Ok(())
    }

    #[test]
    fn relative_watch_path_is_rejected() -> Result<()> {
        let mut settings: Settings = toml::from_str(minimal_toml())?;
        settings.watch.directory_path = Some("vault/docs".into());
        let result = settings.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                reason: "not_absolute",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn zero_attempts_are_rejected() -> Result<()> {
        let mut settings: Settings = toml::from_str(minimal_toml())?;
        settings.lock.max_attempts = 0;
        assert!(settings.validate().is_err());
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"
            [api]
            host = "h"
            port = 8000
            username = "u"
            password = "p"
            tls = true

            [watch]
            file_id = "1"
        "#;
        assert!(toml::from_str::<Settings>(raw).is_err());
    }
}

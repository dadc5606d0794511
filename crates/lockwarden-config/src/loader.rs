//! Configuration file loading.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Load and validate daemon settings from a TOML file.
///
/// # Errors
///
/// Returns [`ConfigError::Missing`] when the file does not exist,
/// [`ConfigError::Io`]/[`ConfigError::Parse`] on read or decode failure,
/// and [`ConfigError::InvalidField`] when validation rejects a field. All
/// of these are fatal: the daemon refuses to start on a bad configuration.
pub async fn load(path: &Path) -> ConfigResult<Settings> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let settings: Settings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_and_validates_a_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("lockwarden.toml");
        fs::write(
            &path,
            r#"
                [api]
                host = "cluster.example.com"
                port = 8000
                username = "svc-lock"
                password = "secret"

                [watch]
                directory_path = "/vault/docs"

                [lock]
                retention = "7d"
            "#,
        )?;

        let settings = load(&path).await?;
        assert_eq!(settings.lock.retention.as_deref(), Some("7d"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_a_distinct_error() {
        let result = load(Path::new("/nonexistent/lockwarden.toml")).await;
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[tokio::test]
    async fn malformed_toml_is_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("lockwarden.toml");
        fs::write(&path, "not = [valid")?;

        let result = load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_at_load() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("lockwarden.toml");
        fs::write(
            &path,
            r#"
                [api]
                host = "cluster.example.com"
                port = 8000
                username = "svc-lock"
                password = "secret"

                [watch]
                directory_path = "relative/path"
            "#,
        )?;

        let result = load(&path).await;
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
        Ok(())
    }
}

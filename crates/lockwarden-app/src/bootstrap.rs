//! Application boot sequence.
//!
//! # Design
//!
//! - Dependency construction (`from_env`) is separate from the boot
//!   sequence (`run_app_with`) so tests can inject a scripted collaborator.
//! - Settings are loaded once at startup; a bad configuration refuses to
//!   start rather than being retried.

use std::path::Path;
use std::sync::Arc;

use lockwarden_client::{RestClientConfig, RestStorageClient};
use lockwarden_config::Settings;
use lockwarden_core::storage::StorageApi;
use lockwarden_telemetry::LoggingConfig;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::supervisor::Supervisor;

/// Environment variable naming the daemon's configuration file.
pub const CONFIG_ENV: &str = "LOCKWARDEN_CONFIG";

/// Dependencies required to boot the daemon.
pub(crate) struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    settings: Settings,
    storage: Arc<dyn StorageApi>,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the environment.
    pub(crate) async fn from_env() -> AppResult<Self> {
        let logging = LoggingConfig::default();
        let config_path = std::env::var(CONFIG_ENV).map_err(|_| AppError::MissingEnv {
            name: CONFIG_ENV,
        })?;
        let settings = lockwarden_config::load(Path::new(&config_path))
            .await
            .map_err(|err| AppError::config("settings.load", err))?;
        let storage = build_client(&settings)?;
        Ok(Self {
            logging,
            settings,
            storage,
        })
    }
}

fn build_client(settings: &Settings) -> AppResult<Arc<dyn StorageApi>> {
    let mut config = RestClientConfig::for_host(
        &settings.api.host,
        settings.api.port,
        settings.api.username.clone(),
        settings.api.password.clone(),
    )
    .map_err(|err| AppError::client("client.config", err))?;
    config.accept_invalid_certs = settings.api.accept_invalid_certs;
    let client =
        RestStorageClient::new(config).map_err(|err| AppError::client("client.build", err))?;
    Ok(Arc::new(client))
}

/// Entry point for the daemon boot sequence.
///
/// # Errors
///
/// Returns an error if dependency construction or startup fails; once the
/// supervisor is running this never returns.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env().await?;
    Box::pin(run_app_with(dependencies)).await
}

/// Boot sequence that relies entirely on injected dependencies.
pub(crate) async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    lockwarden_telemetry::init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    let BootstrapDependencies {
        logging: _,
        settings,
        storage,
    } = dependencies;

    let target = settings
        .target_ref()
        .map_err(|err| AppError::config("settings.target_ref", err))?;
    let output = settings
        .daemon
        .output_file
        .as_deref()
        .map_or_else(|| "none".to_owned(), |path| path.display().to_string());
    info!(
        build = lockwarden_telemetry::build_sha(),
        host = %settings.api.host,
        port = settings.api.port,
        target = %target,
        recursive = settings.watch.recursive,
        settle_secs = settings.watch.settle_delay_secs,
        retention = settings.lock.retention.as_deref().unwrap_or("none"),
        legal_hold = settings.lock.legal_hold,
        output = %output,
        "lockwarden daemon starting"
    );

    let supervisor = Supervisor::new(settings, storage);
    supervisor.run().await;
    Ok(())
}

//! Restart supervision for the watch pipeline.
//!
//! # Design
//!
//! - One cycle is: establish a session, resolve the watch target, consume
//!   the notification stream until it faults. Every fault restarts the
//!   cycle after a fixed pause; the supervisor itself never exits.
//! - The lock orchestrator is created once and shared across cycles, so
//!   the cooldown cache survives stream restarts.

use std::sync::Arc;

use lockwarden_config::{LockSettings, Settings, WatchSettings};
use lockwarden_core::lock::{LockOrchestrator, LockPolicy};
use lockwarden_core::resolve::resolve_target;
use lockwarden_core::storage::StorageApi;
use lockwarden_core::watch::{ConsumerSettings, NotificationConsumer};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Runs watch cycles forever, restarting after every fault.
pub struct Supervisor {
    settings: Settings,
    storage: Arc<dyn StorageApi>,
    consumer: NotificationConsumer,
}

impl Supervisor {
    /// Wire the pipeline components from validated settings.
    #[must_use]
    pub fn new(settings: Settings, storage: Arc<dyn StorageApi>) -> Self {
        let mut orchestrator =
            LockOrchestrator::new(Arc::clone(&storage), lock_policy(&settings.lock));
        if let Some(path) = settings.daemon.output_file.clone() {
            orchestrator = orchestrator.with_output(path);
        }
        let consumer = NotificationConsumer::new(
            Arc::clone(&storage),
            Arc::new(orchestrator),
            consumer_settings(&settings.watch),
        );
        Self {
            settings,
            storage,
            consumer,
        }
    }

    /// Run watch cycles until the process is killed.
    pub async fn run(&self) {
        let restart_delay = self.settings.daemon.restart_delay();
        loop {
            if let Err(err) = self.cycle().await {
                warn!(
                    error = %err,
                    restart_secs = restart_delay.as_secs(),
                    "watch cycle faulted; restarting"
                );
            } else {
                warn!(
                    restart_secs = restart_delay.as_secs(),
                    "watch cycle ended without a fault; restarting"
                );
            }
            sleep(restart_delay).await;
        }
    }

    async fn cycle(&self) -> AppResult<()> {
        self.storage
            .login()
            .await
            .map_err(|err| AppError::client("session.login", err))?;
        let reference = self
            .settings
            .target_ref()
            .map_err(|err| AppError::config("settings.target_ref", err))?;
        let target = resolve_target(
            self.storage.as_ref(),
            &reference,
            self.settings.watch.recursive,
        )
        .await
        .map_err(|source| AppError::Resolve { source })?;
        info!(id = %target.id, path = %target.path, "watch target resolved");

        self.consumer
            .run(&target)
            .await
            .map_err(|source| AppError::Watch { source })
    }
}

pub(crate) fn lock_policy(settings: &LockSettings) -> LockPolicy {
    LockPolicy {
        retention: settings.retention.clone(),
        legal_hold: settings.legal_hold,
        cooldown: settings.cooldown(),
        max_attempts: settings.max_attempts,
        retry_delay: settings.retry_delay(),
    }
}

pub(crate) fn consumer_settings(settings: &WatchSettings) -> ConsumerSettings {
    ConsumerSettings {
        kinds: settings.events.clone(),
        settle_delay: settings.settle_delay(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::Result;
    use lockwarden_config::{ApiSettings, DaemonSettings};
    use lockwarden_core::error::StorageError;
    use lockwarden_core::storage::EventKind;
    use lockwarden_test_support::storage::{ScriptedStorage, StreamStep};
    use serde_json::json;
    use tokio::time::timeout;

    fn test_settings() -> Settings {
        Settings {
            api: ApiSettings {
                host: "cluster.example.com".into(),
                port: 8000,
                username: "svc-lock".into(),
                password: "secret".into(),
                accept_invalid_certs: false,
            },
            watch: WatchSettings {
                file_id: Some("10123".into()),
                directory_path: None,
                recursive: true,
                events: vec![EventKind::FileAdded],
                settle_delay_secs: 0,
            },
            lock: LockSettings {
                retention: Some("7d".into()),
                legal_hold: false,
                cooldown_secs: 5,
                max_attempts: 3,
                retry_delay_secs: 0,
            },
            daemon: DaemonSettings {
                restart_delay_secs: 0,
                output_file: None,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stream_fault_restarts_the_cycle_without_exiting() -> Result<()> {
        let storage = Arc::new(ScriptedStorage::new());
        storage.push_stream(vec![StreamStep::Fault("stream reset".into())]);
        storage.push_stream(vec![
            StreamStep::Batch(vec![json!({"type": "child_file_added", "path": "new.txt"})]),
            StreamStep::Fault("stream reset".into()),
        ]);
        let supervisor = Supervisor::new(test_settings(), Arc::clone(&storage) as Arc<dyn StorageApi>);

        let outcome = timeout(Duration::from_secs(60), supervisor.run()).await;
        assert!(outcome.is_err(), "the supervisor never exits");

        let calls = storage.lock_calls();
        assert_eq!(calls.len(), 1, "the event after the restart was locked");
        assert_eq!(calls[0].path, "/scripted/new.txt");
        assert!(storage.login_count() >= 2, "each cycle re-establishes a session");
        Ok(())
    }

    #[tokio::test]
    async fn cycle_surfaces_login_failure() {
        let storage = Arc::new(ScriptedStorage::new());
        storage.push_login_result(Err(StorageError::Auth {
            detail: "rejected".into(),
        }));
        let supervisor = Supervisor::new(test_settings(), Arc::clone(&storage) as Arc<dyn StorageApi>);

        let result = supervisor.cycle().await;
        assert!(matches!(result, Err(AppError::Client { .. })));
    }

    #[tokio::test]
    async fn cycle_surfaces_missing_target() {
        let storage = Arc::new(ScriptedStorage::new());
        storage.push_attributes(Err(StorageError::NotFound {
            reference: "id:10123".into(),
        }));
        let supervisor = Supervisor::new(test_settings(), Arc::clone(&storage) as Arc<dyn StorageApi>);

        let result = supervisor.cycle().await;
        assert!(matches!(result, Err(AppError::Resolve { .. })));
    }

    #[test]
    fn settings_map_onto_policy_and_consumer() {
        let settings = test_settings();

        let policy = lock_policy(&settings.lock);
        assert_eq!(policy.retention.as_deref(), Some("7d"));
        assert_eq!(policy.cooldown, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::ZERO);

        let consumer = consumer_settings(&settings.watch);
        assert_eq!(consumer.kinds, vec![EventKind::FileAdded]);
        assert_eq!(consumer.settle_delay, Duration::ZERO);
    }
}

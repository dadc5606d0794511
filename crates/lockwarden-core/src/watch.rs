//! Change-notification consumer.
//!
//! Drives the collaborator's notification stream for one supervisor cycle:
//! validates payload shape, filters event kinds, maps relative paths onto
//! the watched root, waits out the settling delay, and hands each target to
//! the lock orchestrator. Handling is strictly serialized; the settling
//! delay throttles end-to-end throughput by design so filesystem writes can
//! complete before the lock lands.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::WatchError;
use crate::lock::{LockOrchestrator, LockOutcome};
use crate::paths;
use crate::resolve::MonitoredTarget;
use crate::storage::{EventKind, FileRef, StorageApi};

/// Consumer knobs supplied by the configuration layer.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Event kinds that trigger a lock attempt.
    pub kinds: Vec<EventKind>,
    /// Pause between detecting an event and locking, letting writes settle.
    pub settle_delay: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            kinds: vec![EventKind::FileAdded],
            settle_delay: Duration::from_secs(15),
        }
    }
}

/// Raw notification entry before kind filtering.
#[derive(Debug, Deserialize)]
struct RawChange {
    #[serde(rename = "type")]
    kind: String,
    path: Option<String>,
}

/// Consumes one notification stream and drives the lock orchestrator.
pub struct NotificationConsumer {
    storage: Arc<dyn StorageApi>,
    orchestrator: Arc<LockOrchestrator>,
    settings: ConsumerSettings,
}

impl NotificationConsumer {
    /// Construct a consumer over the given collaborator and orchestrator.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageApi>,
        orchestrator: Arc<LockOrchestrator>,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            storage,
            orchestrator,
            settings,
        }
    }

    /// Consume the stream until it faults or closes.
    ///
    /// The stream is infinite under normal operation, so this only returns
    /// on failure; the supervisor opens a fresh stream afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] when the stream faults or ends.
    pub async fn run(&self, target: &MonitoredTarget) -> Result<(), WatchError> {
        let root = FileRef::Id(target.id.clone());
        let mut stream = self
            .storage
            .open_change_stream(&root, target.recursive, &self.settings.kinds)
            .await
            .map_err(|source| WatchError::Stream { source })?;
        info!(
            path = %target.path,
            recursive = target.recursive,
            "listening for change notifications"
        );

        loop {
            let batch = stream
                .next_batch()
                .await
                .map_err(|source| WatchError::Stream { source })?
                .ok_or(WatchError::StreamClosed)?;
            for payload in batch {
                self.handle_payload(target, payload).await;
            }
        }
    }

    async fn handle_payload(&self, target: &MonitoredTarget, payload: serde_json::Value) {
        if !payload.is_object() {
            warn!(payload = %payload, "unexpected notification payload shape");
            return;
        }
        let change: RawChange = match serde_json::from_value(payload) {
            Ok(change) => change,
            Err(err) => {
                warn!(error = %err, "undecodable notification payload");
                return;
            }
        };
        let Some(kind) = EventKind::from_wire(&change.kind) else {
            debug!(kind = %change.kind, "ignored change of unknown kind");
            return;
        };
        if !self.settings.kinds.contains(&kind) {
            debug!(kind = kind.wire_name(), path = ?change.path, "ignored filtered change");
            return;
        }
        let Some(relative) = change.path else {
            warn!(kind = kind.wire_name(), "notification carried no path");
            return;
        };

        let absolute = paths::join_under_root(&target.path, &relative);
        info!(
            kind = kind.wire_name(),
            path = %absolute,
            settle_secs = self.settings.settle_delay.as_secs(),
            "change notification received; waiting for writes to settle"
        );
        sleep(self.settings.settle_delay).await;

        match self.orchestrator.apply_lock(&absolute).await {
            Ok(LockOutcome::Locked) => {}
            Ok(LockOutcome::Skipped(reason)) => {
                debug!(path = %absolute, reason = ?reason, "lock skipped");
            }
            Ok(LockOutcome::Failed(reason)) => {
                warn!(path = %absolute, reason = ?reason, "lock failed");
            }
            // A malformed path rejects this event only; the stream goes on.
            Err(err) => warn!(error = %err, path = %absolute, "lock target rejected"),
        }
    }
}

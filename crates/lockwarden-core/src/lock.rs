//! Lock orchestration: cooldown dedup, attribute checks, and the bounded
//! retry loop around the lock RPC.
//!
//! # Design
//!
//! - The dedup cache is owned by the orchestrator instance and lives for
//!   one supervisor run; it is never pruned and does not survive restart,
//!   so a crash re-permits one redundant lock attempt per path.
//! - The cache sits behind a mutex so per-path mutual exclusion on lock
//!   RPCs holds if the consumer loop is ever parallelised.
//! - A retention specification that fails to parse or resolve downgrades
//!   the attempt to legal-hold-only instead of aborting it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::LockError;
use crate::paths;
use crate::retention::{RetentionSpec, format_retention};
use crate::storage::{FileAttributes, FileRef, FileType, StorageApi};

/// Lock behaviour knobs supplied by the configuration layer.
#[derive(Debug, Clone)]
pub struct LockPolicy {
    /// Raw retention specification; resolved per attempt so relative
    /// durations are anchored at lock time. `None` means no retention.
    pub retention: Option<String>,
    /// Whether to place an indefinite legal hold.
    pub legal_hold: bool,
    /// Minimum interval between two lock attempts on the same path.
    pub cooldown: Duration,
    /// Total lock RPC attempts per event.
    pub max_attempts: u32,
    /// Fixed pause between lock RPC attempts.
    pub retry_delay: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            retention: None,
            legal_hold: false,
            cooldown: Duration::from_secs(5),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of one orchestrated lock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The lock RPC succeeded.
    Locked,
    /// No RPC was issued.
    Skipped(SkipReason),
    /// All local recovery was exhausted.
    Failed(FailReason),
}

/// Why a lock attempt was skipped without an RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A successful lock for this path is still inside the cooldown window.
    Cooldown,
    /// The target is a directory; directories are never locked.
    Directory,
}

/// Why a lock attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// Attribute lookup failed twice (including one session refresh).
    AttrLookup,
    /// Every lock RPC attempt failed.
    MaxRetries,
}

/// Applies WORM locks with dedup and bounded retry.
pub struct LockOrchestrator {
    storage: Arc<dyn StorageApi>,
    policy: LockPolicy,
    // absolute path -> instant of the last successful lock RPC
    attempts: Mutex<HashMap<String, Instant>>,
    output: Option<PathBuf>,
}

impl LockOrchestrator {
    /// Construct an orchestrator over the given collaborator.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageApi>, policy: LockPolicy) -> Self {
        Self {
            storage,
            policy,
            attempts: Mutex::new(HashMap::new()),
            output: None,
        }
    }

    /// Append a timestamped line to `path` after each successful lock.
    #[must_use]
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    /// Apply a WORM lock to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::RelativePath`] when `path` is not absolute;
    /// every other failure mode is reported through [`LockOutcome`] so the
    /// consumer keeps processing subsequent events.
    pub async fn apply_lock(&self, path: &str) -> Result<LockOutcome, LockError> {
        if !paths::is_absolute(path) {
            return Err(LockError::RelativePath {
                path: path.to_owned(),
            });
        }
        let path = paths::normalize(path);

        if self.within_cooldown(&path).await {
            debug!(path = %path, "lock attempt inside cooldown window");
            return Ok(LockOutcome::Skipped(SkipReason::Cooldown));
        }

        let Some(attributes) = self.fetch_attributes(&path).await else {
            return Ok(LockOutcome::Failed(FailReason::AttrLookup));
        };
        if attributes.file_type == FileType::Directory {
            debug!(path = %path, "target is a directory; not locking");
            return Ok(LockOutcome::Skipped(SkipReason::Directory));
        }

        let retention = self.effective_retention();
        if retention.is_none() && !self.policy.legal_hold {
            warn!(
                path = %path,
                "lock carries neither retention nor legal hold; issuing anyway"
            );
        }

        self.issue_lock(&path, retention).await
    }

    async fn within_cooldown(&self, path: &str) -> bool {
        let cache = self.attempts.lock().await;
        cache
            .get(path)
            .is_some_and(|last| last.elapsed() < self.policy.cooldown)
    }

    /// Attribute fetch with one transparent session refresh on failure.
    async fn fetch_attributes(&self, path: &str) -> Option<FileAttributes> {
        let reference = FileRef::Path(path.to_owned());
        match self.storage.get_attributes(&reference).await {
            Ok(attributes) => Some(attributes),
            Err(err) => {
                warn!(
                    error = %err,
                    path = %path,
                    "attribute lookup failed; refreshing session"
                );
                if let Err(err) = self.storage.login().await {
                    warn!(error = %err, "session refresh failed");
                }
                match self.storage.get_attributes(&reference).await {
                    Ok(attributes) => Some(attributes),
                    Err(err) => {
                        error!(
                            error = %err,
                            path = %path,
                            "attribute lookup failed after session refresh"
                        );
                        None
                    }
                }
            }
        }
    }

    fn effective_retention(&self) -> Option<DateTime<Utc>> {
        let raw = self.policy.retention.as_deref()?;
        match RetentionSpec::parse(raw).and_then(|spec| spec.resolve(Utc::now())) {
            Ok(deadline) => Some(deadline),
            Err(err) => {
                warn!(
                    error = %err,
                    spec = %raw,
                    "retention specification rejected; locking without retention"
                );
                None
            }
        }
    }

    async fn issue_lock(
        &self,
        path: &str,
        retention: Option<DateTime<Utc>>,
    ) -> Result<LockOutcome, LockError> {
        for attempt in 1..=self.policy.max_attempts {
            match self
                .storage
                .apply_lock(path, retention, self.policy.legal_hold)
                .await
            {
                Ok(()) => {
                    let mut cache = self.attempts.lock().await;
                    cache.insert(path.to_owned(), Instant::now());
                    drop(cache);
                    info!(
                        path = %path,
                        retention = retention.map(format_retention).as_deref().unwrap_or("none"),
                        legal_hold = self.policy.legal_hold,
                        "file locked"
                    );
                    self.record_success(path).await;
                    return Ok(LockOutcome::Locked);
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        path = %path,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        "lock attempt failed"
                    );
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }
        error!(
            path = %path,
            attempts = self.policy.max_attempts,
            "exhausted lock attempts"
        );
        Ok(LockOutcome::Failed(FailReason::MaxRetries))
    }

    /// Sink I/O errors are logged, never fatal.
    async fn record_success(&self, path: &str) {
        let Some(sink) = &self.output else {
            return;
        };
        let line = format!("{} - locked {path}\n", format_retention(Utc::now()));
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(sink)
                .await?;
            file.write_all(line.as_bytes()).await
        }
        .await;
        if let Err(err) = result {
            warn!(error = %err, sink = %sink.display(), "failed to append to output sink");
        }
    }
}

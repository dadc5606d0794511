//! Scripted in-memory implementation of the storage collaborator.
//!
//! Responses are queued ahead of a test and popped per call; when a queue
//! is empty a permissive default applies (file attributes synthesized from
//! the reference, successful locks, a stream that stays pending forever).
//! Every call is recorded so tests can assert on exact RPC counts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lockwarden_core::error::StorageError;
use lockwarden_core::storage::{
    ChangeStream, EventKind, FileAttributes, FileRef, FileType, StorageApi,
};

/// One step of a scripted change stream.
#[derive(Debug, Clone)]
pub enum StreamStep {
    /// Deliver a batch of raw notification payloads.
    Batch(Vec<serde_json::Value>),
    /// Fault the stream with a transport error carrying this detail.
    Fault(String),
    /// End the stream without a fault.
    Close,
}

/// A recorded lock RPC.
#[derive(Debug, Clone)]
pub struct LockCall {
    /// Absolute path the lock was requested for.
    pub path: String,
    /// Retention deadline carried by the request.
    pub retention: Option<DateTime<Utc>>,
    /// Legal hold flag carried by the request.
    pub legal_hold: bool,
}

/// A recorded `open_change_stream` invocation.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Root the stream was opened under.
    pub root: FileRef,
    /// Recursion flag.
    pub recursive: bool,
    /// Kind filter passed to the cluster.
    pub kinds: Vec<EventKind>,
}

#[derive(Default)]
struct Script {
    login_results: VecDeque<Result<(), StorageError>>,
    attributes: VecDeque<Result<FileAttributes, StorageError>>,
    streams: VecDeque<Vec<StreamStep>>,
    lock_results: VecDeque<Result<(), StorageError>>,
}

#[derive(Default)]
struct CallLog {
    logins: usize,
    attribute_lookups: Vec<FileRef>,
    stream_requests: Vec<StreamRequest>,
    locks: Vec<LockCall>,
}

/// Scripted storage backend.
#[derive(Default)]
pub struct ScriptedStorage {
    script: Mutex<Script>,
    calls: Mutex<CallLog>,
}

impl ScriptedStorage {
    /// Construct a backend with empty scripts (permissive defaults).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next `login` result.
    pub fn push_login_result(&self, result: Result<(), StorageError>) {
        self.lock_script().login_results.push_back(result);
    }

    /// Queue the next `get_attributes` result.
    pub fn push_attributes(&self, result: Result<FileAttributes, StorageError>) {
        self.lock_script().attributes.push_back(result);
    }

    /// Queue the script for the next opened change stream.
    pub fn push_stream(&self, steps: Vec<StreamStep>) {
        self.lock_script().streams.push_back(steps);
    }

    /// Queue the next `apply_lock` result.
    pub fn push_lock_result(&self, result: Result<(), StorageError>) {
        self.lock_script().lock_results.push_back(result);
    }

    /// Number of `login` calls observed.
    #[must_use]
    pub fn login_count(&self) -> usize {
        self.lock_calls_log().logins
    }

    /// References passed to `get_attributes`, in call order.
    #[must_use]
    pub fn attribute_lookups(&self) -> Vec<FileRef> {
        self.lock_calls_log().attribute_lookups.clone()
    }

    /// Recorded `open_change_stream` invocations, in call order.
    #[must_use]
    pub fn stream_requests(&self) -> Vec<StreamRequest> {
        self.lock_calls_log().stream_requests.clone()
    }

    /// Recorded lock RPCs, in call order.
    #[must_use]
    pub fn lock_calls(&self) -> Vec<LockCall> {
        self.lock_calls_log().locks.clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_calls_log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn default_attributes(reference: &FileRef) -> FileAttributes {
        match reference {
            FileRef::Id(id) => FileAttributes {
                id: id.clone(),
                path: "/scripted".to_owned(),
                file_type: FileType::File,
            },
            FileRef::Path(path) => FileAttributes {
                id: "1".to_owned(),
                path: path.clone(),
                file_type: FileType::File,
            },
        }
    }
}

#[async_trait]
impl StorageApi for ScriptedStorage {
    async fn login(&self) -> Result<(), StorageError> {
        self.lock_calls_log().logins += 1;
        self.lock_script().login_results.pop_front().unwrap_or(Ok(()))
    }

    async fn get_attributes(&self, reference: &FileRef) -> Result<FileAttributes, StorageError> {
        self.lock_calls_log().attribute_lookups.push(reference.clone());
        self.lock_script()
            .attributes
            .pop_front()
            .unwrap_or_else(|| Ok(Self::default_attributes(reference)))
    }

    async fn open_change_stream(
        &self,
        root: &FileRef,
        recursive: bool,
        kinds: &[EventKind],
    ) -> Result<Box<dyn ChangeStream>, StorageError> {
        self.lock_calls_log().stream_requests.push(StreamRequest {
            root: root.clone(),
            recursive,
            kinds: kinds.to_vec(),
        });
        let steps = self.lock_script().streams.pop_front().unwrap_or_default();
        Ok(Box::new(ScriptedStream {
            steps: steps.into(),
        }))
    }

    async fn apply_lock(
        &self,
        path: &str,
        retention: Option<DateTime<Utc>>,
        legal_hold: bool,
    ) -> Result<(), StorageError> {
        self.lock_calls_log().locks.push(LockCall {
            path: path.to_owned(),
            retention,
            legal_hold,
        });
        self.lock_script().lock_results.pop_front().unwrap_or(Ok(()))
    }
}

/// Stream driven by a queued step script; pends forever once exhausted,
/// mimicking a quiet cluster.
struct ScriptedStream {
    steps: VecDeque<StreamStep>,
}

#[async_trait]
impl ChangeStream for ScriptedStream {
    async fn next_batch(&mut self) -> Result<Option<Vec<serde_json::Value>>, StorageError> {
        match self.steps.pop_front() {
            Some(StreamStep::Batch(batch)) => Ok(Some(batch)),
            Some(StreamStep::Fault(detail)) => Err(StorageError::Transport {
                operation: "files.notify",
                detail,
            }),
            Some(StreamStep::Close) => Ok(None),
            None => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

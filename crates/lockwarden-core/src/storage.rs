//! Contracts the core pipeline requires from the storage cluster.
//!
//! The traits here mirror the four operations the daemon depends on:
//! session login, attribute lookup, change-notification streaming, and the
//! lock RPC. Concrete transports live in sibling crates; tests use the
//! scripted backend from `lockwarden-test-support`.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Reference to a filesystem object on the cluster, by opaque identifier or
/// by absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
    /// Opaque cluster-assigned identifier.
    Id(String),
    /// Absolute path on the cluster filesystem.
    Path(String),
}

impl fmt::Display for FileRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(formatter, "id:{id}"),
            Self::Path(path) => write!(formatter, "path:{path}"),
        }
    }
}

/// Object type reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    #[serde(rename = "FS_FILE_TYPE_FILE")]
    File,
    /// Directory.
    #[serde(rename = "FS_FILE_TYPE_DIRECTORY")]
    Directory,
    /// Any other object kind (symlink, special file).
    #[serde(other)]
    Other,
}

/// Attributes returned by the cluster for a referenced object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Opaque cluster-assigned identifier.
    pub id: String,
    /// Canonical absolute path.
    pub path: String,
    /// Object type.
    #[serde(rename = "type")]
    pub file_type: FileType,
}

/// Change-notification kinds the consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A file was created under the watched target.
    #[serde(rename = "child_file_added", alias = "file_added")]
    FileAdded,
    /// An ACL changed under the watched target.
    #[serde(rename = "child_acl_changed", alias = "acl_changed")]
    AclChanged,
    /// Extended attributes changed under the watched target.
    #[serde(rename = "child_extra_attrs_changed", alias = "attrs_changed")]
    AttrsChanged,
}

impl EventKind {
    /// Wire name used in notification payloads and stream filters.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::FileAdded => "child_file_added",
            Self::AclChanged => "child_acl_changed",
            Self::AttrsChanged => "child_extra_attrs_changed",
        }
    }

    /// Map a wire name back to a kind, if recognised.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "child_file_added" => Some(Self::FileAdded),
            "child_acl_changed" => Some(Self::AclChanged),
            "child_extra_attrs_changed" => Some(Self::AttrsChanged),
            _ => None,
        }
    }
}

/// Operations the core requires from the storage collaborator.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Establish (or re-establish) an authenticated session.
    async fn login(&self) -> Result<(), StorageError>;

    /// Look up attributes for the referenced object.
    async fn get_attributes(&self, reference: &FileRef) -> Result<FileAttributes, StorageError>;

    /// Open a live change-notification stream rooted at `root`.
    async fn open_change_stream(
        &self,
        root: &FileRef,
        recursive: bool,
        kinds: &[EventKind],
    ) -> Result<Box<dyn ChangeStream>, StorageError>;

    /// Apply a WORM lock to the file at `path`.
    async fn apply_lock(
        &self,
        path: &str,
        retention: Option<DateTime<Utc>>,
        legal_hold: bool,
    ) -> Result<(), StorageError>;
}

/// Live notification stream opened by [`StorageApi::open_change_stream`].
///
/// Batches carry raw JSON values: shape validation belongs to the consumer,
/// which treats malformed payloads as a non-fatal protocol anomaly.
#[async_trait]
pub trait ChangeStream: Send {
    /// Next batch of notification payloads; `None` when the stream ends.
    async fn next_batch(&mut self) -> Result<Option<Vec<serde_json::Value>>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn event_kind_round_trips_wire_names() {
        for kind in [EventKind::FileAdded, EventKind::AclChanged, EventKind::AttrsChanged] {
            assert_eq!(EventKind::from_wire(kind.wire_name()), Some(kind));
        }
        assert_eq!(EventKind::from_wire("child_file_removed"), None);
    }

    #[test]
    fn event_kind_accepts_config_aliases() -> Result<()> {
        let kind: EventKind = serde_json::from_value(json!("file_added"))?;
        assert_eq!(kind, EventKind::FileAdded);
        let kind: EventKind = serde_json::from_value(json!("child_acl_changed"))?;
        assert_eq!(kind, EventKind::AclChanged);
        Ok(())
    }

    #[test]
    fn attributes_decode_cluster_payload() -> Result<()> {
        let attrs: FileAttributes = serde_json::from_value(json!({
            "id": "10123",
            "path": "/vault/docs",
            "type": "FS_FILE_TYPE_DIRECTORY",
        }))?;
        assert_eq!(attrs.file_type, FileType::Directory);
        assert_eq!(attrs.path, "/vault/docs");
        Ok(())
    }

    #[test]
    fn unknown_file_type_maps_to_other() -> Result<()> {
        let attrs: FileAttributes = serde_json::from_value(json!({
            "id": "7",
            "path": "/vault/link",
            "type": "FS_FILE_TYPE_SYMLINK",
        }))?;
        assert_eq!(attrs.file_type, FileType::Other);
        Ok(())
    }
}

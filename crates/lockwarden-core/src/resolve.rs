//! Monitored-target resolution.
//!
//! A watch is configured with either an opaque identifier or an absolute
//! path; the resolver asks the cluster for the attributes of the referenced
//! object and produces the canonical pair used for the rest of the cycle.

use crate::error::{ResolveError, StorageError};
use crate::paths;
use crate::storage::{FileRef, StorageApi};

/// Canonical description of the watched object, produced once per
/// supervisor cycle and immutable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTarget {
    /// Opaque cluster identifier of the watched object.
    pub id: String,
    /// Normalized absolute path of the watched object.
    pub path: String,
    /// Whether events are collected from the whole subtree.
    pub recursive: bool,
}

/// Resolve a configured reference into a [`MonitoredTarget`].
///
/// # Errors
///
/// Returns [`ResolveError::Missing`] when the cluster reports the object
/// absent and [`ResolveError::Lookup`] for any other collaborator fault.
/// Callers stop the current cycle on either; the supervisor retries.
pub async fn resolve_target(
    storage: &dyn StorageApi,
    reference: &FileRef,
    recursive: bool,
) -> Result<MonitoredTarget, ResolveError> {
    match storage.get_attributes(reference).await {
        Ok(attributes) => Ok(MonitoredTarget {
            id: attributes.id,
            path: paths::normalize(&attributes.path),
            recursive,
        }),
        Err(StorageError::NotFound { reference }) => Err(ResolveError::Missing { reference }),
        Err(source) => Err(ResolveError::Lookup {
            reference: reference.to_string(),
            source,
        }),
    }
}

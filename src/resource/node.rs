//! Resource map node and opaque resource identity.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::ResourceKind;

/// Namespace of one scope: local id -> entry.
///
/// Ordered so that serialized snapshots (and their digests) are stable.
pub type IdMap = BTreeMap<String, ResourceMapNode>;

/// Per-process counter mixed into generated ids.
static GENERATED: AtomicU64 = AtomicU64::new(0);

/// Immutable opaque identifier assigned when a resource is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a fresh id from a seed (typically the local id).
    pub fn generate(seed: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let n = GENERATED.fetch_add(1, Ordering::Relaxed);

        let mut hasher = blake3::Hasher::new();
        hasher.update(seed.as_bytes());
        hasher.update(&nanos.to_le_bytes());
        hasher.update(&n.to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        Self(hex::encode(&hasher.finalize().as_bytes()[..8]))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One entry of the id map.
///
/// Only container (`teidoc`) entries carry `ids`. A `deleted` entry is a
/// tombstone: it hides the same key of every lower layer when merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMapNode {
    #[serde(rename = "resourceID")]
    pub resource_id: ResourceId,

    #[serde(rename = "resourceKind")]
    pub kind: ResourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ids: Option<IdMap>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ResourceMapNode {
    /// Create an entry. Containers start with an empty namespace.
    pub fn new(resource_id: ResourceId, kind: ResourceKind) -> Self {
        Self {
            resource_id,
            kind,
            ids: kind.is_container().then(IdMap::new),
            deleted: false,
        }
    }

    /// Create an empty `teidoc` container entry.
    pub fn container(resource_id: ResourceId) -> Self {
        Self::new(resource_id, ResourceKind::Teidoc)
    }

    /// Create a container entry with the given children.
    pub fn container_with(resource_id: ResourceId, ids: IdMap) -> Self {
        Self {
            resource_id,
            kind: ResourceKind::Teidoc,
            ids: Some(ids),
            deleted: false,
        }
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Child namespace (containers only).
    pub fn ids(&self) -> Option<&IdMap> {
        if self.is_container() {
            self.ids.as_ref()
        } else {
            None
        }
    }

    /// Mutable child namespace (containers only).
    ///
    /// A container deserialized without `ids` gets an empty one.
    pub fn ids_mut(&mut self) -> Option<&mut IdMap> {
        if self.is_container() {
            Some(self.ids.get_or_insert_with(IdMap::new))
        } else {
            None
        }
    }

    /// Number of children (0 for leaves).
    pub fn child_count(&self) -> usize {
        self.ids().map_or(0, |ids| ids.len())
    }

    /// Get a direct child entry by local id.
    pub fn child(&self, local_id: &str) -> Option<&ResourceMapNode> {
        self.ids()?.get(local_id)
    }

    /// Same identity and kind, no children.
    ///
    /// This is the copy-on-write clone placed in a higher layer before
    /// children are added there.
    pub fn empty_clone(&self) -> Self {
        Self::new(self.resource_id.clone(), self.kind)
    }

    /// Copy marked as deleted.
    pub fn tombstone(&self) -> Self {
        Self {
            deleted: true,
            ..self.clone()
        }
    }

    /// Take ownership with the deleted mark cleared.
    pub fn revived(mut self) -> Self {
        self.deleted = false;
        self
    }
}

/// Serialize a layer for the archive.
pub fn to_json(map: &IdMap) -> serde_json::Result<String> {
    serde_json::to_string(map)
}

/// Parse a layer from the archive. Blank input is an empty layer.
pub fn from_json(data: &str) -> serde_json::Result<IdMap> {
    if data.trim().is_empty() {
        return Ok(IdMap::new());
    }
    serde_json::from_str(data)
}

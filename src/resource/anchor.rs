//! Internal anchors (element ids, surface ids) as flat sibling entries.
//!
//! An anchor `a` of resource `L` lives next to `L` in the same scope under
//! the synthetic key `L#a`, so it is addressable without nesting:
//!
//! ```text
//! teidoc "letters"
//!   ├── "facs"           facsimile  (resourceID f1)
//!   ├── "facs#surface1"  image      (resourceID f1#surface1)
//!   └── "body"           text       (resourceID t1)
//! ```

use super::{ResourceId, ResourceKind, ResourceMapNode};

/// Separator between owner local id and anchor id.
pub const ANCHOR_SEPARATOR: char = '#';

/// Synthetic key for anchor `anchor` of the resource at `local_id`.
pub fn anchor_key(local_id: &str, anchor: &str) -> String {
    format!("{local_id}{ANCHOR_SEPARATOR}{anchor}")
}

/// Split a synthetic key into `(owner local id, anchor id)`.
pub fn split_anchor_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(ANCHOR_SEPARATOR)
        .filter(|(owner, anchor)| !owner.is_empty() && !anchor.is_empty())
}

/// If `key` is an anchor of `local_id`, return the anchor id.
pub fn anchor_of<'a>(key: &'a str, local_id: &str) -> Option<&'a str> {
    split_anchor_key(key).and_then(|(owner, anchor)| (owner == local_id).then_some(anchor))
}

/// Whether `key` names an anchor entry rather than a resource.
#[inline]
pub fn is_anchor_key(key: &str) -> bool {
    split_anchor_key(key).is_some()
}

impl ResourceMapNode {
    /// Entry for anchor `anchor` of the resource `owner`.
    pub fn anchor(owner: &ResourceId, anchor: &str, kind: ResourceKind) -> Self {
        Self::new(
            ResourceId::new(format!("{owner}{ANCHOR_SEPARATOR}{anchor}")),
            kind,
        )
    }
}

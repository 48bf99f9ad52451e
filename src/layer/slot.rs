//! Slots: an entry together with its anchor entries.
//!
//! Anything that relocates an entry (between scopes or between layers)
//! moves the whole slot, so anchors always follow their owner and are
//! re-keyed when the owner's local id changes.

use crate::resource::{IdMap, ResourceId, ResourceMapNode, anchor_key, anchor_of};

use super::merge::{Tombstones, overlay};

/// Mutable namespace for `parent_id` (the root when `None`).
pub fn scope_mut<'a>(layer: &'a mut IdMap, parent_id: Option<&str>) -> Option<&'a mut IdMap> {
    match parent_id {
        None => Some(layer),
        Some(parent) => layer.get_mut(parent)?.ids_mut(),
    }
}

/// An entry and its anchors, detached from any scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot {
    /// The owning entry, if this layer holds one
    pub entry: Option<ResourceMapNode>,
    /// Anchor id -> anchor entry
    pub anchors: Vec<(String, ResourceMapNode)>,
}

impl Slot {
    pub fn of(entry: ResourceMapNode) -> Self {
        Self {
            entry: Some(entry),
            anchors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.anchors.is_empty()
    }

    /// Opaque id of the owning entry.
    pub fn resource_id(&self) -> Option<&ResourceId> {
        self.entry.as_ref().map(|e| &e.resource_id)
    }

    /// Copy the slot at `local_id` out of `scope`.
    pub fn peek(scope: &IdMap, local_id: &str) -> Self {
        Self {
            entry: scope.get(local_id).cloned(),
            anchors: scope
                .iter()
                .filter_map(|(key, node)| {
                    anchor_of(key, local_id).map(|anchor| (anchor.to_string(), node.clone()))
                })
                .collect(),
        }
    }

    /// Remove the slot at `local_id` from `scope`.
    pub fn take(scope: &mut IdMap, local_id: &str) -> Self {
        let anchor_keys: Vec<String> = scope
            .keys()
            .filter(|key| anchor_of(key, local_id).is_some())
            .cloned()
            .collect();

        let anchors = anchor_keys
            .into_iter()
            .filter_map(|key| {
                let node = scope.remove(&key)?;
                let anchor = anchor_of(&key, local_id)?.to_string();
                Some((anchor, node))
            })
            .collect();

        Self {
            entry: scope.remove(local_id),
            anchors,
        }
    }

    /// Write the slot into `scope` at `local_id`, replacing what is there.
    pub fn put(self, scope: &mut IdMap, local_id: &str) {
        scope.extend(self.into_entries(local_id));
    }

    /// Overlay the slot onto `scope` at `local_id` using merge semantics.
    pub fn overlay_onto(self, scope: &mut IdMap, local_id: &str, tombstones: Tombstones) {
        let entries: IdMap = self.into_entries(local_id).collect();
        overlay(scope, &entries, tombstones);
    }

    /// Every entry of the slot marked deleted.
    pub fn tombstoned(self) -> Self {
        self.map_entries(|node| node.tombstone())
    }

    /// Every entry of the slot with the deleted mark cleared.
    pub fn revived(self) -> Self {
        self.map_entries(ResourceMapNode::revived)
    }

    /// Drop tombstoned anchors (and the entry, if tombstoned).
    pub fn live(self) -> Self {
        Self {
            entry: self.entry.filter(|e| !e.deleted),
            anchors: self.anchors.into_iter().filter(|(_, n)| !n.deleted).collect(),
        }
    }

    fn map_entries(self, f: impl Fn(ResourceMapNode) -> ResourceMapNode) -> Self {
        Self {
            entry: self.entry.map(&f),
            anchors: self
                .anchors
                .into_iter()
                .map(|(anchor, node)| (anchor, f(node)))
                .collect(),
        }
    }

    fn into_entries(self, local_id: &str) -> impl Iterator<Item = (String, ResourceMapNode)> {
        let owner = local_id.to_string();
        self.entry
            .map(|entry| (owner.clone(), entry))
            .into_iter()
            .chain(
                self.anchors
                    .into_iter()
                    .map(move |(anchor, node)| (anchor_key(&owner, &anchor), node)),
            )
    }
}

//! Layered store: named id-map layers plus the cached merged view.

use std::sync::Arc;

use super::merge::{Tombstones, merge};
use super::slot::{Slot, scope_mut};
use super::{LayerName, REMOTE_LAYERS};
use crate::address;
use crate::debug;
use crate::manager::MapError;
use crate::resource::IdMap;

/// Layers of one project, overlaid in `order` to form the merged view.
///
/// All three layers always exist in memory; only those listed in `order`
/// take part in the merge.
#[derive(Debug, Clone)]
pub struct LayeredStore {
    base: IdMap,
    staged: IdMap,
    next: IdMap,
    /// Active layers, least to most authoritative-for-editing
    order: &'static [LayerName],
    /// Read-only view handed to consumers
    merged: Arc<IdMap>,
}

impl LayeredStore {
    /// Create an empty store with the given active layers.
    pub fn new(order: &'static [LayerName]) -> Self {
        Self {
            base: IdMap::new(),
            staged: IdMap::new(),
            next: IdMap::new(),
            order,
            merged: Arc::new(IdMap::new()),
        }
    }

    /// Active layers, least to most authoritative-for-editing.
    pub fn order(&self) -> &'static [LayerName] {
        self.order
    }

    pub fn is_active(&self, name: LayerName) -> bool {
        self.order.contains(&name)
    }

    pub fn layer(&self, name: LayerName) -> &IdMap {
        match name {
            LayerName::Base => &self.base,
            LayerName::Staged => &self.staged,
            LayerName::Next => &self.next,
        }
    }

    pub fn layer_mut(&mut self, name: LayerName) -> &mut IdMap {
        match name {
            LayerName::Base => &mut self.base,
            LayerName::Staged => &mut self.staged,
            LayerName::Next => &mut self.next,
        }
    }

    /// Replace a layer wholesale. Call [`recompute`](Self::recompute) after.
    pub fn replace(&mut self, name: LayerName, map: IdMap) {
        *self.layer_mut(name) = map;
    }

    /// Active layers below `name`, freshest first.
    pub fn below(&self, name: LayerName) -> Vec<LayerName> {
        self.order
            .iter()
            .rev()
            .copied()
            .filter(|layer| *layer < name)
            .collect()
    }

    /// Recompute the merged view from the active layers.
    pub fn recompute(&mut self) -> &Arc<IdMap> {
        let merged = merge(self.order.iter().map(|name| self.layer(*name)));
        self.merged = Arc::new(merged);
        &self.merged
    }

    /// Current merged view (shared, read-only).
    pub fn merged(&self) -> &Arc<IdMap> {
        &self.merged
    }

    // ========================================================================
    // Slot access
    // ========================================================================

    pub fn peek(&self, name: LayerName, local_id: &str, parent_id: Option<&str>) -> Slot {
        address::scope(self.layer(name), parent_id)
            .map(|scope| Slot::peek(scope, local_id))
            .unwrap_or_default()
    }

    pub fn take(&mut self, name: LayerName, local_id: &str, parent_id: Option<&str>) -> Slot {
        scope_mut(self.layer_mut(name), parent_id)
            .map(|scope| Slot::take(scope, local_id))
            .unwrap_or_default()
    }

    /// Whether `name` has an entry (live or tombstone) at the address.
    pub fn contains(&self, name: LayerName, local_id: &str, parent_id: Option<&str>) -> bool {
        address::lookup(self.layer(name), local_id, parent_id).is_some()
    }

    /// Write a slot; the parent container must already exist in the layer.
    ///
    /// Use [`ensure_container`](Self::ensure_container) first.
    pub fn put(
        &mut self,
        name: LayerName,
        local_id: &str,
        parent_id: Option<&str>,
        slot: Slot,
    ) -> Result<(), MapError> {
        let Some(scope) = scope_mut(self.layer_mut(name), parent_id) else {
            return Err(missing_container(name, parent_id));
        };
        slot.put(scope, local_id);
        Ok(())
    }

    /// Overlay a slot onto what the layer holds at the address.
    pub fn overlay(
        &mut self,
        name: LayerName,
        local_id: &str,
        parent_id: Option<&str>,
        slot: Slot,
        tombstones: Tombstones,
    ) -> Result<(), MapError> {
        let Some(scope) = scope_mut(self.layer_mut(name), parent_id) else {
            return Err(missing_container(name, parent_id));
        };
        slot.overlay_onto(scope, local_id, tombstones);
        Ok(())
    }

    // ========================================================================
    // Copy-on-write
    // ========================================================================

    /// Make sure `target` holds the container `parent_id`.
    ///
    /// When absent, an empty clone (identity only, no children) is taken from
    /// the first of `sources` holding a live container at that key. Failing
    /// that is an invariant violation.
    pub fn ensure_container(
        &mut self,
        target: LayerName,
        parent_id: Option<&str>,
        sources: &[LayerName],
    ) -> Result<(), MapError> {
        let Some(parent) = parent_id else {
            return Ok(());
        };

        if let Some(existing) = self.layer(target).get(parent) {
            if !existing.is_container() {
                return Err(MapError::NotAContainer {
                    parent_id: parent.to_string(),
                    kind: existing.kind,
                    layer: target,
                });
            }
            if !existing.deleted {
                return Ok(());
            }
        }

        let clone = sources
            .iter()
            .filter_map(|source| self.layer(*source).get(parent))
            .find(|node| node.is_container() && !node.deleted)
            .map(|node| node.empty_clone());

        match clone {
            Some(clone) => {
                debug!("map"; "clone container {} into {}", parent, target);
                self.layer_mut(target).insert(parent.to_string(), clone);
                Ok(())
            }
            None => Err(missing_container(target, parent_id)),
        }
    }
}

fn missing_container(name: LayerName, parent_id: Option<&str>) -> MapError {
    MapError::MissingContainer {
        parent_id: parent_id.unwrap_or_default().to_string(),
        layer: name,
    }
}

impl Default for LayeredStore {
    fn default() -> Self {
        Self::new(REMOTE_LAYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LOCAL_LAYERS;
    use crate::resource::{ResourceKind, ResourceMapNode};

    fn text(id: &str) -> ResourceMapNode {
        ResourceMapNode::new(id.into(), ResourceKind::Text)
    }

    #[test]
    fn test_below_is_freshest_first() {
        let store = LayeredStore::new(REMOTE_LAYERS);
        assert_eq!(
            store.below(LayerName::Next),
            vec![LayerName::Staged, LayerName::Base]
        );
        assert!(store.below(LayerName::Base).is_empty());

        let local = LayeredStore::new(LOCAL_LAYERS);
        assert_eq!(local.below(LayerName::Next), vec![LayerName::Base]);
    }

    #[test]
    fn test_inactive_layer_not_merged() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        store.layer_mut(LayerName::Staged).insert("x".into(), text("r1"));
        store.layer_mut(LayerName::Base).insert("y".into(), text("r2"));
        store.recompute();

        assert!(!store.merged().contains_key("x"));
        assert!(store.merged().contains_key("y"));
    }

    #[test]
    fn test_ensure_container_clones_empty() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        let mut doc = ResourceMapNode::container("d1".into());
        doc.ids_mut().unwrap().insert("a".into(), text("r1"));
        store.layer_mut(LayerName::Base).insert("doc".into(), doc);

        store
            .ensure_container(LayerName::Next, Some("doc"), &[LayerName::Base])
            .unwrap();

        let clone = &store.layer(LayerName::Next)["doc"];
        assert_eq!(clone.resource_id, "d1");
        assert_eq!(clone.child_count(), 0);
        assert_eq!(store.layer(LayerName::Base)["doc"].child_count(), 1);
    }

    #[test]
    fn test_ensure_container_missing_is_fatal() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        let err = store
            .ensure_container(LayerName::Next, Some("doc"), &[LayerName::Base])
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, MapError::MissingContainer { .. }));
    }

    #[test]
    fn test_ensure_container_rejects_leaf_parent() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        store.layer_mut(LayerName::Next).insert("doc".into(), text("r1"));

        let err = store
            .ensure_container(LayerName::Next, Some("doc"), &[LayerName::Base])
            .unwrap_err();
        assert!(matches!(err, MapError::NotAContainer { .. }));
    }

    #[test]
    fn test_ensure_container_root_is_noop() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        store
            .ensure_container(LayerName::Next, None, &[LayerName::Base])
            .unwrap();
        assert!(store.layer(LayerName::Next).is_empty());
    }

    #[test]
    fn test_put_without_parent_fails() {
        let mut store = LayeredStore::new(LOCAL_LAYERS);
        let result = store.put(
            LayerName::Base,
            "a",
            Some("doc"),
            Slot::of(text("r1")),
        );
        assert!(result.is_err());
    }
}

//! Layer merge algorithm.
//!
//! ```text
//! base     { doc: {a, b}, x }
//! staged   { doc: {b'} }           container: merged recursively
//! next     { x: deleted, y }       tombstone: removes x
//! ------------------------------------------------------------
//! merged   { doc: {a, b'}, y }
//! ```
//!
//! Leaves are never partially merged: a leaf in a higher layer replaces the
//! lower entry wholesale. Containers in both layers are merged key by key,
//! and the higher layer's identity (`resourceID`, kind) wins.

use crate::resource::{IdMap, ResourceMapNode};

/// What a tombstone in the overlay does to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tombstones {
    /// Remove the key (merged views, commits into a self-authoritative base).
    Apply,
    /// Store the tombstone itself (commits into a layer awaiting check-in).
    Keep,
}

/// Merge layers ordered from least to most authoritative.
///
/// The result is a fresh deep copy; it never contains tombstones.
pub fn merge<'a, I>(layers: I) -> IdMap
where
    I: IntoIterator<Item = &'a IdMap>,
{
    let mut layers = layers.into_iter();
    let mut acc = layers.next().map(live_copy).unwrap_or_default();
    for layer in layers {
        overlay(&mut acc, layer, Tombstones::Apply);
    }
    acc
}

/// Overlay `layer` onto `acc` in place.
pub fn overlay(acc: &mut IdMap, layer: &IdMap, tombstones: Tombstones) {
    for (key, entry) in layer {
        if entry.deleted {
            match tombstones {
                Tombstones::Apply => {
                    acc.remove(key);
                }
                Tombstones::Keep => {
                    acc.insert(key.clone(), entry.clone());
                }
            }
            continue;
        }

        match acc.get_mut(key) {
            Some(existing) if existing.is_container() && entry.is_container() => {
                overlay_entry(existing, entry, tombstones);
            }
            _ => {
                acc.insert(key.clone(), copy(entry, tombstones));
            }
        }
    }
}

/// Overlay a live container entry onto an existing container entry.
pub fn overlay_entry(existing: &mut ResourceMapNode, entry: &ResourceMapNode, tombstones: Tombstones) {
    existing.resource_id = entry.resource_id.clone();
    existing.kind = entry.kind;
    existing.deleted = false;
    if let (Some(acc_ids), Some(ids)) = (existing.ids_mut(), entry.ids()) {
        overlay(acc_ids, ids, tombstones);
    }
}

fn copy(entry: &ResourceMapNode, tombstones: Tombstones) -> ResourceMapNode {
    match tombstones {
        Tombstones::Keep => entry.clone(),
        Tombstones::Apply => live_node(entry),
    }
}

/// Deep copy of a layer with tombstones dropped at every depth.
fn live_copy(layer: &IdMap) -> IdMap {
    layer
        .iter()
        .filter(|(_, node)| !node.deleted)
        .map(|(key, node)| (key.clone(), live_node(node)))
        .collect()
}

fn live_node(node: &ResourceMapNode) -> ResourceMapNode {
    match node.ids() {
        Some(ids) => ResourceMapNode::container_with(node.resource_id.clone(), live_copy(ids)),
        None => node.clone(),
    }
}

//! Exchange with the remote authority: base snapshots, check-out, check-in.

use serde::{Deserialize, Serialize};

use super::{MapManager, Persist, Result};
use crate::address::{self, Address};
use crate::debug;
use crate::layer::{LayerName, Slot, Tombstones};
use crate::resource::{IdMap, ResourceId};

/// One resource accepted (or deleted) by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInEntry {
    #[serde(rename = "resourceID")]
    pub resource_id: ResourceId,
    #[serde(default)]
    pub deleted: bool,
}

impl CheckInEntry {
    pub fn accepted(resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            deleted: false,
        }
    }

    pub fn deleted(resource_id: ResourceId) -> Self {
        Self {
            resource_id,
            deleted: true,
        }
    }
}

impl MapManager {
    /// Replace `base` with a snapshot pushed by the authority.
    pub fn set_base_map(&mut self, map_data: IdMap) -> Result<Persist> {
        self.require_remote("setBaseMap")?;

        self.store.replace(LayerName::Base, map_data);
        debug!("map"; "base replaced ({} root entries)", self.store.layer(LayerName::Base).len());
        self.refresh();
        self.persist_base()
    }

    /// Copy authority entries into `staged` so they can be edited locally.
    pub fn check_out(&mut self, resource_ids: &[ResourceId]) -> Result<Persist> {
        self.require_remote("checkOut")?;

        for resource_id in resource_ids {
            let Some(found) = address::resolve_live(resource_id, self.store.layer(LayerName::Base))
            else {
                continue;
            };
            if address::resolve(resource_id, self.store.layer(LayerName::Staged)).is_some() {
                continue;
            }

            self.store
                .ensure_container(LayerName::Staged, found.parent(), &[LayerName::Base])?;
            let copy = self
                .store
                .peek(LayerName::Base, &found.local_id, found.parent())
                .live();
            self.store
                .put(LayerName::Staged, &found.local_id, found.parent(), copy)?;
            debug!("map"; "check out {}", found);
        }

        self.refresh();
        self.persist()
    }

    /// Accept staged work into `base`.
    ///
    /// Deleted entries are purged from both layers. Live entries move from
    /// `staged` to `base`, replacing any other base placement of the same id.
    /// Returns the new base snapshot and the new staged layer, in that order.
    pub fn check_in(&mut self, entries: &[CheckInEntry]) -> Result<Vec<Persist>> {
        self.require_remote("checkIn")?;

        let mut instantiated = Vec::new();
        for entry in entries {
            if entry.deleted {
                self.purge(LayerName::Staged, &entry.resource_id, None);
                self.purge(LayerName::Base, &entry.resource_id, None);
                debug!("map"; "check in deletion of {}", entry.resource_id);
                continue;
            }

            let staged = self.store.layer(LayerName::Staged);
            let Some(found) = address::resolve_live(&entry.resource_id, staged) else {
                continue;
            };
            if let Some(parent) = self.accept(&entry.resource_id, &found)? {
                instantiated.push(parent);
            }
            debug!("map"; "check in {}", found);
        }

        self.prune(&instantiated);
        self.refresh();
        Ok(vec![self.persist_base()?, self.persist()?])
    }

    /// Move the staged slot at `found` into base.
    ///
    /// Returns the parent container if base had to instantiate it.
    fn accept(&mut self, resource_id: &ResourceId, found: &Address) -> Result<Option<String>> {
        let (local_id, parent_id) = (found.local_id.as_str(), found.parent());
        let slot = self.store.take(LayerName::Staged, local_id, parent_id);

        // Old placements: tombstones in staged, stale copies in base.
        self.purge(LayerName::Staged, resource_id, None);
        self.purge(LayerName::Base, resource_id, Some(found));

        let instantiated = parent_id.filter(|parent| {
            self.store
                .layer(LayerName::Base)
                .get(*parent)
                .is_none_or(|node| node.deleted)
        });
        self.store
            .ensure_container(LayerName::Base, parent_id, &[LayerName::Staged])?;

        let Slot { entry, anchors } = slot;
        match entry {
            Some(node) if node.is_container() => {
                // Identity only: children are checked in on their own.
                let identity = Slot {
                    entry: Some(node.empty_clone()),
                    anchors,
                };
                self.store.overlay(
                    LayerName::Base,
                    local_id,
                    parent_id,
                    identity,
                    Tombstones::Apply,
                )?;
                self.store
                    .put(LayerName::Staged, local_id, parent_id, Slot::of(node))?;
            }
            entry => {
                let slot = Slot { entry, anchors };
                self.store
                    .overlay(LayerName::Base, local_id, parent_id, slot, Tombstones::Apply)?;
            }
        }

        Ok(instantiated.map(str::to_string))
    }

    /// Remove every placement of `resource_id` from `layer`, except `keep`.
    fn purge(&mut self, layer: LayerName, resource_id: &ResourceId, keep: Option<&Address>) {
        for found in address::resolve_all(resource_id, self.store.layer(layer)) {
            if keep != Some(&found) {
                self.store.take(layer, &found.local_id, found.parent());
            }
        }
    }

    /// Drop containers left empty by a check-in.
    ///
    /// In `staged`: empty live containers that only mirror the base container
    /// with the same id. In `base`: containers this check-in created.
    fn prune(&mut self, instantiated: &[String]) {
        let base = self.store.layer(LayerName::Base);
        let mirrors: Vec<String> = self
            .store
            .layer(LayerName::Staged)
            .iter()
            .filter(|(key, node)| {
                node.is_container()
                    && !node.deleted
                    && node.child_count() == 0
                    && base
                        .get(*key)
                        .is_some_and(|b| !b.deleted && b.resource_id == node.resource_id)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in mirrors {
            self.store.layer_mut(LayerName::Staged).remove(&key);
        }

        let base = self.store.layer_mut(LayerName::Base);
        for key in instantiated {
            if base
                .get(key)
                .is_some_and(|node| node.is_container() && node.child_count() == 0)
            {
                base.remove(key);
            }
        }
    }
}

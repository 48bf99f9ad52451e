//! Operations available in both modes.
//!
//! Drafts live in `next`. Everything else writes the durable layer
//! (`base` locally, `staged` when a remote authority owns `base`).

use super::{MapError, MapManager, Mode, Persist, Rename, Result};
use crate::address::{self, Address};
use crate::broadcast::AnchorSpec;
use crate::debug;
use crate::layer::{LayerName, Slot, Tombstones};
use crate::resource::{ResourceId, ResourceMapNode, anchor_of};

impl MapManager {
    /// Layers a durable write may clone a missing parent container from:
    /// lower layers first (freshest first), then the draft layer.
    fn clone_sources(&self, target: LayerName) -> Vec<LayerName> {
        let mut sources = self.store.below(target);
        sources.extend(
            self.store
                .order()
                .iter()
                .copied()
                .filter(|layer| *layer > target),
        );
        sources
    }

    // =========================================================================
    // Drafts
    // =========================================================================

    /// Write a draft entry into `next`, cloning its container first if needed.
    pub fn set_resource_map(
        &mut self,
        resource_map: ResourceMapNode,
        local_id: &str,
        parent_id: Option<&str>,
    ) -> Result<()> {
        let sources = self.store.below(LayerName::Next);
        self.store
            .ensure_container(LayerName::Next, parent_id, &sources)?;
        self.store
            .put(LayerName::Next, local_id, parent_id, Slot::of(resource_map))?;

        debug!("map"; "draft {}", Address::new(local_id, parent_id));
        self.refresh();
        Ok(())
    }

    /// Discard the draft at the address (entry and anchors).
    pub fn abandon_resource_map(&mut self, local_id: &str, parent_id: Option<&str>) {
        let draft = self.store.take(LayerName::Next, local_id, parent_id);
        if draft.is_empty() {
            return;
        }
        debug!("map"; "abandon {}", Address::new(local_id, parent_id));
        self.refresh();
    }

    /// Replace the anchor set of a resource with `anchors` (as a draft).
    ///
    /// Anchors visible in the merged view but not listed are tombstoned.
    pub fn set_anchors(
        &mut self,
        local_id: &str,
        parent_id: Option<&str>,
        anchors: &[AnchorSpec],
    ) -> Result<()> {
        let merged = self.store.merged();
        let Some(owner) = address::lookup(merged, local_id, parent_id) else {
            return Ok(());
        };
        let owner = owner.resource_id.clone();

        let mut slot = Slot::default();
        for spec in anchors {
            let node = ResourceMapNode::anchor(&owner, &spec.anchor, spec.kind);
            slot.anchors.push((spec.anchor.clone(), node));
        }
        if let Some(scope) = address::scope(merged, parent_id) {
            for (key, node) in scope {
                if let Some(anchor) = anchor_of(key, local_id)
                    && !anchors.iter().any(|spec| spec.anchor == anchor)
                {
                    slot.anchors.push((anchor.to_string(), node.tombstone()));
                }
            }
        }

        let sources = self.store.below(LayerName::Next);
        self.store
            .ensure_container(LayerName::Next, parent_id, &sources)?;
        self.store.put(LayerName::Next, local_id, parent_id, slot)?;

        debug!("map"; "anchors of {}: {}", Address::new(local_id, parent_id), anchors.len());
        self.refresh();
        Ok(())
    }

    // =========================================================================
    // Durable edits
    // =========================================================================

    /// Insert an entry straight into the durable layer.
    pub fn add_resource(
        &mut self,
        local_id: &str,
        parent_id: Option<&str>,
        resource_map: ResourceMapNode,
    ) -> Result<Persist> {
        let durable = self.mode.durable();
        let sources = self.clone_sources(durable);
        self.store.ensure_container(durable, parent_id, &sources)?;
        self.store
            .put(durable, local_id, parent_id, Slot::of(resource_map))?;

        debug!("map"; "add {} to {}", Address::new(local_id, parent_id), durable);
        self.refresh();
        self.persist()
    }

    /// Remove resources by opaque id.
    ///
    /// Locally the entries are deleted from every layer. In remote mode the
    /// draft is dropped and the staged entry becomes a tombstone awaiting
    /// check-in.
    pub fn remove_resources(&mut self, resource_ids: &[ResourceId]) -> Result<Persist> {
        for resource_id in resource_ids {
            match self.mode {
                Mode::Local => {
                    for layer in [LayerName::Next, LayerName::Base] {
                        self.take_by_id(layer, resource_id);
                    }
                }
                Mode::Remote => self.tombstone_staged(resource_id)?,
            }
        }

        debug!("map"; "removed {} resources", resource_ids.len());
        self.refresh();
        self.persist()
    }

    fn take_by_id(&mut self, layer: LayerName, resource_id: &ResourceId) -> Slot {
        match address::resolve_live(resource_id, self.store.layer(layer)) {
            Some(found) => self.store.take(layer, &found.local_id, found.parent()),
            None => Slot::default(),
        }
    }

    fn tombstone_staged(&mut self, resource_id: &ResourceId) -> Result<()> {
        self.take_by_id(LayerName::Next, resource_id);

        if let Some(found) = address::resolve_live(resource_id, self.store.layer(LayerName::Staged))
        {
            let slot = self
                .store
                .take(LayerName::Staged, &found.local_id, found.parent());
            return self.store.put(
                LayerName::Staged,
                &found.local_id,
                found.parent(),
                slot.tombstoned(),
            );
        }

        // Only the authority has it: stage a tombstone over the base copy.
        if let Some(found) = address::resolve_live(resource_id, self.store.layer(LayerName::Base)) {
            self.store
                .ensure_container(LayerName::Staged, found.parent(), &[LayerName::Base])?;
            let slot = self
                .store
                .peek(LayerName::Base, &found.local_id, found.parent())
                .live()
                .tombstoned();
            self.store
                .put(LayerName::Staged, &found.local_id, found.parent(), slot)?;
        }
        Ok(())
    }

    /// Undo a remote removal: revive the staged tombstone and promote any
    /// draft queued at the same address onto it.
    pub fn recover_resources(&mut self, resource_ids: &[ResourceId]) -> Result<Persist> {
        self.require_remote("recoverResources")?;

        for resource_id in resource_ids {
            let staged = self.store.layer(LayerName::Staged);
            if address::resolve_live(resource_id, staged).is_some() {
                continue;
            }
            let Some(found) = self.removal_of(resource_id) else {
                continue;
            };

            let (local_id, parent_id) = (found.local_id.as_str(), found.parent());
            let revived = self
                .store
                .take(LayerName::Staged, local_id, parent_id)
                .revived();
            self.store
                .put(LayerName::Staged, local_id, parent_id, revived)?;

            let draft = self.store.take(LayerName::Next, local_id, parent_id);
            if !draft.is_empty() {
                self.store.overlay(
                    LayerName::Staged,
                    local_id,
                    parent_id,
                    draft,
                    Tombstones::Keep,
                )?;
            }
            debug!("map"; "recover {}", found);
        }

        self.refresh();
        self.persist()
    }

    /// Staged tombstone left by removing `resource_id`.
    ///
    /// A move also leaves a tombstone over the old base placement; prefer
    /// one that does not merely hide the base entry.
    fn removal_of(&self, resource_id: &ResourceId) -> Option<Address> {
        let base = self.store.layer(LayerName::Base);
        let hides_base = |found: &Address| {
            address::lookup(base, &found.local_id, found.parent())
                .is_some_and(|node| &node.resource_id == resource_id)
        };

        let placements = address::resolve_all(resource_id, self.store.layer(LayerName::Staged));
        placements
            .iter()
            .find(|found| !hides_base(found))
            .or_else(|| placements.first())
            .cloned()
    }

    /// Move (and optionally rename) a resource to another container.
    ///
    /// The freshest representation at the old address is taken from every
    /// writable layer and written to the durable layer at the new address.
    pub fn move_resource_map(
        &mut self,
        local_id: &str,
        old_local_id: &str,
        new_parent_id: Option<&str>,
        old_parent_id: Option<&str>,
    ) -> Result<Persist> {
        if local_id == old_local_id && new_parent_id == old_parent_id {
            return self.persist();
        }

        let freshest = address::scope(self.store.merged(), old_parent_id)
            .map(|scope| Slot::peek(scope, old_local_id))
            .unwrap_or_default();
        let Some(resource_id) = freshest.resource_id().cloned() else {
            return self.persist();
        };
        self.check_move(&freshest, local_id, old_local_id, new_parent_id, old_parent_id)?;

        let durable = self.mode.durable();
        let sources = self.clone_sources(durable);
        self.store
            .ensure_container(durable, new_parent_id, &sources)?;

        let hidden = self.base_slot_to_hide(old_local_id, old_parent_id);
        if hidden.is_some() {
            self.store
                .ensure_container(LayerName::Staged, old_parent_id, &[LayerName::Base])?;
        }

        self.store.take(LayerName::Next, old_local_id, old_parent_id);
        self.store.take(durable, old_local_id, old_parent_id);
        if let Some(tombstone) = hidden {
            self.store
                .put(LayerName::Staged, old_local_id, old_parent_id, tombstone)?;
        }
        self.store
            .put(durable, local_id, new_parent_id, freshest)?;

        debug!(
            "map"; "move {} {} -> {}",
            resource_id,
            Address::new(old_local_id, old_parent_id),
            Address::new(local_id, new_parent_id)
        );
        self.refresh();
        self.persist()
    }

    /// Reject moves the map cannot hold, before anything is taken.
    fn check_move(
        &self,
        moved: &Slot,
        local_id: &str,
        old_local_id: &str,
        new_parent_id: Option<&str>,
        old_parent_id: Option<&str>,
    ) -> Result<()> {
        let invalid = |reason| MapError::InvalidMove {
            from: Address::new(old_local_id, old_parent_id),
            to: Address::new(local_id, new_parent_id),
            reason,
        };
        let merged = self.store.merged();

        if new_parent_id == Some(old_local_id) && old_parent_id.is_none() {
            return Err(invalid("a resource cannot contain itself"));
        }
        if new_parent_id.is_some() && moved.entry.as_ref().is_some_and(|e| e.is_container()) {
            return Err(invalid("containers live at the root"));
        }
        if let Some(parent) = new_parent_id
            && address::lookup(merged, parent, None).is_some_and(|node| !node.is_container())
        {
            return Err(invalid("the destination is not a container"));
        }

        let resource_id = moved.resource_id();
        if address::lookup(merged, local_id, new_parent_id)
            .is_some_and(|node| Some(&node.resource_id) != resource_id)
        {
            return Err(invalid("the destination is taken"));
        }
        if let Some(pending) = self.pending_removal(local_id, new_parent_id, resource_id) {
            return Err(MapError::PendingRemoval {
                address: Address::new(local_id, new_parent_id),
                resource_id: pending,
            });
        }
        Ok(())
    }

    /// In remote mode, the id of another resource whose removal is staged
    /// at the address.
    fn pending_removal(
        &self,
        local_id: &str,
        parent_id: Option<&str>,
        resource_id: Option<&ResourceId>,
    ) -> Option<ResourceId> {
        if self.mode != Mode::Remote {
            return None;
        }
        address::lookup(self.store.layer(LayerName::Staged), local_id, parent_id)
            .filter(|node| node.deleted && Some(&node.resource_id) != resource_id)
            .map(|node| node.resource_id.clone())
    }

    /// In remote mode, the tombstone that hides a base entry at the address.
    fn base_slot_to_hide(&self, local_id: &str, parent_id: Option<&str>) -> Option<Slot> {
        if self.mode != Mode::Remote {
            return None;
        }
        let slot = self
            .store
            .peek(LayerName::Base, local_id, parent_id)
            .live();
        slot.entry.is_some().then(|| slot.tombstoned())
    }

    /// Rename a resource's local id within its container.
    ///
    /// Applied independently in every layer holding the old id. Declines
    /// without touching anything when the new id is already taken.
    pub fn change_id(
        &mut self,
        new_id: &str,
        old_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Rename> {
        let Some(renamed) = address::lookup(self.store.merged(), old_id, parent_id)
            .map(|node| node.resource_id.clone())
        else {
            return Ok(Rename::NotFound);
        };
        if new_id == old_id {
            return Ok(Rename::Renamed(self.persist()?));
        }

        let durable = self.mode.durable();
        let live_at = |layer: LayerName, local_id: &str| {
            address::lookup(self.store.layer(layer), local_id, parent_id)
                .is_some_and(|node| !node.deleted)
        };

        let mut holders: Vec<LayerName> = [LayerName::Next, durable]
            .into_iter()
            .filter(|layer| live_at(*layer, old_id))
            .collect();
        let occupied = holders.iter().any(|layer| live_at(*layer, new_id))
            || address::lookup(self.store.merged(), new_id, parent_id).is_some()
            || self
                .pending_removal(new_id, parent_id, Some(&renamed))
                .is_some();
        if occupied {
            debug!("map"; "rename {} declined: `{}` is taken", old_id, new_id);
            return Ok(Rename::Conflict {
                local_id: new_id.to_string(),
            });
        }

        let hidden = self.base_slot_to_hide(old_id, parent_id);
        if hidden.is_some() && !self.store.contains(LayerName::Staged, old_id, parent_id) {
            // Authority-only entry: stage a copy to rename.
            self.store
                .ensure_container(LayerName::Staged, parent_id, &[LayerName::Base])?;
            let copy = self.store.peek(LayerName::Base, old_id, parent_id).live();
            self.store
                .put(LayerName::Staged, old_id, parent_id, copy)?;
            holders.push(LayerName::Staged);
        }

        for layer in holders {
            let slot = self.store.take(layer, old_id, parent_id);
            self.store.put(layer, new_id, parent_id, slot)?;
        }
        if let Some(tombstone) = hidden {
            self.store
                .put(LayerName::Staged, old_id, parent_id, tombstone)?;
        }

        debug!("map"; "rename {} -> {}", Address::new(old_id, parent_id), new_id);
        self.refresh();
        Ok(Rename::Renamed(self.persist()?))
    }

    /// Promote the draft at the address into the durable layer.
    ///
    /// In remote mode a draft cannot replace another resource's staged
    /// removal; that removal has to be checked in or recovered first.
    pub fn commit_resource(&mut self, local_id: &str, parent_id: Option<&str>) -> Result<Persist> {
        let draft = self.store.peek(LayerName::Next, local_id, parent_id);
        if draft.is_empty() {
            return self.persist();
        }
        if let Some(pending) = self.pending_removal(local_id, parent_id, draft.resource_id()) {
            return Err(MapError::PendingRemoval {
                address: Address::new(local_id, parent_id),
                resource_id: pending,
            });
        }

        let durable = self.mode.durable();
        let sources = self.clone_sources(durable);
        self.store.ensure_container(durable, parent_id, &sources)?;

        let draft = self.store.take(LayerName::Next, local_id, parent_id);
        let tombstones = match self.mode {
            Mode::Local => Tombstones::Apply,
            Mode::Remote => Tombstones::Keep,
        };
        self.store
            .overlay(durable, local_id, parent_id, draft, tombstones)?;

        debug!("map"; "commit {} into {}", Address::new(local_id, parent_id), durable);
        self.refresh();
        self.persist()
    }
}

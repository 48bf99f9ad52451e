//! Map Manager - the single writer of a project's id-map layers.
//!
//! One type serves both modes; the mode picks the active layer stack and the
//! layer that receives durable writes:
//!
//! | Mode     | Layers               | Durable layer | Persisted keys             |
//! |----------|----------------------|---------------|----------------------------|
//! | `local`  | base, next           | base          | `id-map`                   |
//! | `remote` | base, staged, next   | staged        | `id-map`, `id-map-base`    |
//!
//! Every mutation recomputes the merged view and hands it to the
//! broadcaster, which skips snapshots identical to the last one sent.
//!
//! # Module Structure
//!
//! - [`edit`]: Operations shared by both modes
//! - [`remote`]: Authority exchange (`set_base_map`, `check_out`, `check_in`)
//! - [`error`]: Error and rename outcome types

mod edit;
mod error;
mod remote;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use crossbeam::channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::address::{self, Address, Reference};
use crate::archive::{Archive, ArchiveError};
use crate::broadcast::{Broadcaster, CorrelationId, MapRequest, MapUpdate};
use crate::debug;
use crate::layer::{LOCAL_LAYERS, LayerName, LayeredStore, REMOTE_LAYERS};
use crate::resource::{self, IdMap, ResourceId, ResourceMapNode};

pub use error::{MapError, Rename, Result};
pub use remote::CheckInEntry;

/// Archive key of the durable layer (base in local mode, staged in remote).
pub const ID_MAP_KEY: &str = "id-map";

/// Archive key of the last authority snapshot (remote mode).
pub const BASE_MAP_KEY: &str = "id-map-base";

// =============================================================================
// Persistence payload
// =============================================================================

/// Serialized layer the caller must write to the durable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persist {
    pub key: &'static str,
    pub data: String,
}

// =============================================================================
// Mode
// =============================================================================

/// Who is authoritative for `base`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The project is its own authority.
    #[default]
    Local,
    /// A remote authority owns `base`; local work is staged until check-in.
    Remote,
}

impl Mode {
    pub const fn layers(self) -> &'static [LayerName] {
        match self {
            Self::Local => LOCAL_LAYERS,
            Self::Remote => REMOTE_LAYERS,
        }
    }

    /// Layer written by commits, adds, removes and moves.
    pub const fn durable(self) -> LayerName {
        match self {
            Self::Local => LayerName::Base,
            Self::Remote => LayerName::Staged,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        [Self::Local, Self::Remote]
            .into_iter()
            .find(|mode| mode.as_str() == tag)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of applying one [`MapRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// In-memory change only (draft edits).
    Applied,
    /// Layers to write to the archive.
    Persist(Vec<Persist>),
    /// Outcome of `changeID`.
    Rename(Rename),
}

impl Outcome {
    /// Payloads to write to the archive, if any.
    pub fn persists(&self) -> &[Persist] {
        match self {
            Self::Persist(persists) => persists,
            Self::Rename(Rename::Renamed(persist)) => std::slice::from_ref(persist),
            _ => &[],
        }
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Owner of the layered id map of one project.
#[derive(Debug)]
pub struct MapManager {
    mode: Mode,
    store: LayeredStore,
    broadcaster: Broadcaster,
    /// Id attached to the next broadcast (set by the owner loop)
    correlation: Option<CorrelationId>,
    /// Id of the last broadcast actually sent
    last_broadcast: Option<CorrelationId>,
    /// Prefix of self-initiated correlation ids
    origin: String,
}

impl MapManager {
    /// Create a manager over existing layers. `staged` is ignored in local mode.
    pub fn new(mode: Mode, base: IdMap, staged: IdMap) -> Self {
        let mut store = LayeredStore::new(mode.layers());
        store.replace(LayerName::Base, base);
        if mode == Mode::Remote {
            store.replace(LayerName::Staged, staged);
        }

        let mut broadcaster = Broadcaster::default();
        broadcaster.prime(store.recompute());

        Self {
            mode,
            store,
            broadcaster,
            correlation: None,
            last_broadcast: None,
            origin: "owner".to_string(),
        }
    }

    /// Self-authoritative manager (base + next).
    pub fn local(base: IdMap) -> Self {
        Self::new(Mode::Local, base, IdMap::new())
    }

    /// Remote-backed manager (base + staged + next).
    pub fn remote(base: IdMap, staged: IdMap) -> Self {
        Self::new(Mode::Remote, base, staged)
    }

    /// Rebuild a manager from the layers persisted in `archive`.
    pub fn load(mode: Mode, archive: &dyn Archive) -> std::result::Result<Self, ArchiveError> {
        let read = |key: &str| -> std::result::Result<IdMap, ArchiveError> {
            match archive.read_blob(key)? {
                Some(data) => {
                    resource::from_json(&data).map_err(|source| ArchiveError::Parse {
                        key: key.to_string(),
                        source,
                    })
                }
                None => Ok(IdMap::new()),
            }
        };

        let manager = match mode {
            Mode::Local => Self::local(read(ID_MAP_KEY)?),
            Mode::Remote => Self::remote(read(BASE_MAP_KEY)?, read(ID_MAP_KEY)?),
        };
        debug!("map"; "loaded {} project ({} root entries)", mode, manager.merged().len());
        Ok(manager)
    }

    /// Use `origin` as the prefix of self-initiated correlation ids.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether `name` is part of this mode's layer stack.
    pub fn has_layer(&self, name: LayerName) -> bool {
        self.store.is_active(name)
    }

    /// Raw contents of one layer.
    pub fn layer(&self, name: LayerName) -> &IdMap {
        self.store.layer(name)
    }

    /// Current merged view (read-only snapshot).
    pub fn merged(&self) -> &Arc<IdMap> {
        self.store.merged()
    }

    // =========================================================================
    // Broadcast plumbing
    // =========================================================================

    /// Register a listener for merged-view updates.
    pub fn subscribe(&mut self) -> Receiver<MapUpdate> {
        self.broadcaster.subscribe()
    }

    /// Attach `id` to the broadcast caused by the next mutation.
    pub fn set_correlation(&mut self, id: CorrelationId) {
        self.correlation = Some(id);
    }

    pub fn clear_correlation(&mut self) {
        self.correlation = None;
    }

    /// Id carried by the most recent broadcast.
    pub fn last_broadcast(&self) -> Option<&CorrelationId> {
        self.last_broadcast.as_ref()
    }

    /// Recompute the merged view and broadcast it if it changed.
    fn refresh(&mut self) {
        let merged = Arc::clone(self.store.recompute());
        let id = self
            .correlation
            .clone()
            .unwrap_or_else(|| CorrelationId::fresh(&self.origin));
        if self.broadcaster.broadcast(&id, &merged) {
            self.last_broadcast = Some(id);
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Serialize the durable layer.
    pub fn persist(&self) -> Result<Persist> {
        let data = resource::to_json(self.store.layer(self.mode.durable()))?;
        Ok(Persist {
            key: ID_MAP_KEY,
            data,
        })
    }

    /// Serialize the authority snapshot (remote mode).
    pub fn persist_base(&self) -> Result<Persist> {
        let data = resource::to_json(self.store.layer(LayerName::Base))?;
        Ok(Persist {
            key: BASE_MAP_KEY,
            data,
        })
    }

    // =========================================================================
    // Reads (merged view)
    // =========================================================================

    /// Entry with the given opaque id.
    pub fn get_resource_map(&self, resource_id: &ResourceId) -> Option<&ResourceMapNode> {
        let found = self.address_of(resource_id)?;
        self.get_resource_map_by_local_id(&found.local_id, found.parent())
    }

    /// Entry at `(parent_id, local_id)`.
    pub fn get_resource_map_by_local_id(
        &self,
        local_id: &str,
        parent_id: Option<&str>,
    ) -> Option<&ResourceMapNode> {
        address::lookup(self.merged(), local_id, parent_id)
    }

    /// Current address of an opaque id.
    pub fn address_of(&self, resource_id: &ResourceId) -> Option<Address> {
        address::resolve(resource_id, self.merged())
    }

    pub fn local_id_of(&self, resource_id: &ResourceId) -> Option<String> {
        self.address_of(resource_id).map(|found| found.local_id)
    }

    pub fn parent_id_of(&self, resource_id: &ResourceId) -> Option<String> {
        self.address_of(resource_id)?.parent_id
    }

    /// Resolve a `parent/local#anchor` reference to its opaque id.
    pub fn resolve_reference(&self, reference: &str) -> Option<ResourceId> {
        let reference = Reference::parse(reference)?;
        address::resolve_reference(self.merged(), &reference)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn require_remote(&self, operation: &'static str) -> Result<()> {
        match self.mode {
            Mode::Remote => Ok(()),
            Mode::Local => Err(MapError::RemoteOnly { operation }),
        }
    }

    /// Apply a forwarded mutation.
    pub fn apply(&mut self, request: MapRequest) -> Result<Outcome> {
        let persisted = |persist: Persist| Outcome::Persist(vec![persist]);

        match request {
            MapRequest::SetResourceMap {
                resource_map,
                local_id,
                parent_id,
            } => {
                self.set_resource_map(resource_map, &local_id, parent_id.as_deref())?;
                Ok(Outcome::Applied)
            }
            MapRequest::AbandonResourceMap {
                local_id,
                parent_id,
            } => {
                self.abandon_resource_map(&local_id, parent_id.as_deref());
                Ok(Outcome::Applied)
            }
            MapRequest::SetAnchors {
                local_id,
                parent_id,
                anchors,
            } => {
                self.set_anchors(&local_id, parent_id.as_deref(), &anchors)?;
                Ok(Outcome::Applied)
            }
            MapRequest::AddResource {
                local_id,
                parent_id,
                resource_map,
            } => self
                .add_resource(&local_id, parent_id.as_deref(), resource_map)
                .map(persisted),
            MapRequest::RemoveResources { resource_ids } => {
                self.remove_resources(&resource_ids).map(persisted)
            }
            MapRequest::RecoverResources { resource_ids } => {
                self.recover_resources(&resource_ids).map(persisted)
            }
            MapRequest::MoveResourceMap {
                local_id,
                old_local_id,
                new_parent_id,
                old_parent_id,
            } => self
                .move_resource_map(
                    &local_id,
                    &old_local_id,
                    new_parent_id.as_deref(),
                    old_parent_id.as_deref(),
                )
                .map(persisted),
            MapRequest::ChangeId {
                new_id,
                old_id,
                parent_id,
            } => self
                .change_id(&new_id, &old_id, parent_id.as_deref())
                .map(Outcome::Rename),
            MapRequest::CommitResource {
                local_id,
                parent_id,
            } => self
                .commit_resource(&local_id, parent_id.as_deref())
                .map(persisted),
            MapRequest::SetBaseMap { map_data } => self.set_base_map(map_data).map(persisted),
            MapRequest::CheckOut { resource_ids } => self.check_out(&resource_ids).map(persisted),
            MapRequest::CheckIn { entries } => self.check_in(&entries).map(Outcome::Persist),
        }
    }
}

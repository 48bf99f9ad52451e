//! Inter-process message definitions.
//!
//! ```text
//! MapReplica --Envelope{MapRequest}--> MapOwner --MapUpdate--> every replica
//!     ^                                   |
//!     +-------------MapReply--------------+
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::Sender;
use serde::{Deserialize, Serialize};

use crate::manager::{CheckInEntry, Outcome};
use crate::resource::{IdMap, ResourceId, ResourceKind, ResourceMapNode};

/// Process-wide sequence for correlation ids.
static SEQUENCE: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Correlation
// =============================================================================

/// Identifies one mutation and the broadcast it caused: `<origin>-<pid>-<seq>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A new id. The process id keeps windows in separate processes apart
    /// even when they share an origin name.
    pub fn fresh(origin: &str) -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{origin}-{}-{seq}", std::process::id()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Broadcast
// =============================================================================

/// Snapshot of the merged view sent to every listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapUpdate {
    #[serde(rename = "correlationID")]
    pub correlation_id: CorrelationId,
    #[serde(rename = "mapData")]
    pub map_data: Arc<IdMap>,
}

// =============================================================================
// Requests
// =============================================================================

/// One anchor of a resource: anchor id and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSpec {
    pub anchor: String,
    pub kind: ResourceKind,
}

/// Mutation forwarded from a replica to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "operation",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum MapRequest {
    SetResourceMap {
        resource_map: ResourceMapNode,
        local_id: String,
        parent_id: Option<String>,
    },
    AbandonResourceMap {
        local_id: String,
        parent_id: Option<String>,
    },
    SetAnchors {
        local_id: String,
        parent_id: Option<String>,
        anchors: Vec<AnchorSpec>,
    },
    AddResource {
        local_id: String,
        parent_id: Option<String>,
        resource_map: ResourceMapNode,
    },
    RemoveResources {
        resource_ids: Vec<ResourceId>,
    },
    RecoverResources {
        resource_ids: Vec<ResourceId>,
    },
    MoveResourceMap {
        local_id: String,
        old_local_id: String,
        new_parent_id: Option<String>,
        old_parent_id: Option<String>,
    },
    ChangeId {
        new_id: String,
        old_id: String,
        parent_id: Option<String>,
    },
    CommitResource {
        local_id: String,
        parent_id: Option<String>,
    },
    SetBaseMap {
        map_data: IdMap,
    },
    CheckOut {
        resource_ids: Vec<ResourceId>,
    },
    CheckIn {
        entries: Vec<CheckInEntry>,
    },
}

impl MapRequest {
    /// Operation name (for logs).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetResourceMap { .. } => "setResourceMap",
            Self::AbandonResourceMap { .. } => "abandonResourceMap",
            Self::SetAnchors { .. } => "setAnchors",
            Self::AddResource { .. } => "addResource",
            Self::RemoveResources { .. } => "removeResources",
            Self::RecoverResources { .. } => "recoverResources",
            Self::MoveResourceMap { .. } => "moveResourceMap",
            Self::ChangeId { .. } => "changeID",
            Self::CommitResource { .. } => "commitResource",
            Self::SetBaseMap { .. } => "setBaseMap",
            Self::CheckOut { .. } => "checkOut",
            Self::CheckIn { .. } => "checkIn",
        }
    }
}

/// Owner's answer to one request.
#[derive(Debug, Clone)]
pub struct MapReply {
    pub correlation_id: CorrelationId,
    /// Operation outcome, or the error message
    pub result: Result<Outcome, String>,
    /// Whether an update carrying `correlation_id` was broadcast
    pub broadcast: bool,
    /// Merged view after the request
    pub map_data: Arc<IdMap>,
}

/// A request in flight, with the channel the reply goes to.
#[derive(Debug)]
pub struct Envelope {
    pub correlation_id: CorrelationId,
    pub request: MapRequest,
    pub reply: Option<Sender<MapReply>>,
}

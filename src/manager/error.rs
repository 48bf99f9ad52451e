//! Map manager error and outcome types.

use thiserror::Error;

use super::Persist;
use crate::address::Address;
use crate::layer::LayerName;
use crate::resource::{ResourceId, ResourceKind};

/// Errors raised by the map manager.
///
/// Not-found conditions are not errors (operations treat them as no-ops),
/// and rename conflicts are reported through [`Rename`].
#[derive(Debug, Error)]
pub enum MapError {
    /// A copy-on-write clone was needed for a container that no source
    /// layer holds. The project manifest and the id map have diverged.
    #[error(
        "container `{parent_id}` is missing from every layer that could seed `{layer}`; \
         the project manifest and its id map have diverged"
    )]
    MissingContainer { parent_id: String, layer: LayerName },

    /// A parent id names an entry that cannot hold children.
    #[error("`{parent_id}` in `{layer}` is a {kind} resource, not a container")]
    NotAContainer {
        parent_id: String,
        kind: ResourceKind,
        layer: LayerName,
    },

    /// A move the map cannot represent. Rejected before anything changed.
    #[error("cannot move `{from}` to `{to}`: {reason}")]
    InvalidMove {
        from: Address,
        to: Address,
        reason: &'static str,
    },

    /// The address still holds a removal awaiting check-in.
    #[error("`{address}` holds `{resource_id}`, removed but not yet checked in")]
    PendingRemoval {
        address: Address,
        resource_id: ResourceId,
    },

    /// Operation that only exists when a remote authority backs the project.
    #[error("`{operation}` is only available in remote mode")]
    RemoteOnly { operation: &'static str },

    #[error("failed to serialize id map")]
    Serialize(#[from] serde_json::Error),
}

impl MapError {
    /// Invariant violations: the project must be reloaded from durable
    /// storage, never retried.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingContainer { .. } | Self::NotAContainer { .. }
        )
    }
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;

/// Outcome of a rename (`change_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rename {
    /// Renamed in every layer holding the old id.
    Renamed(Persist),
    /// No layer holds the old id; nothing changed.
    NotFound,
    /// The new id is already taken; nothing changed, nothing broadcast.
    Conflict {
        /// The occupied local id
        local_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let missing = MapError::MissingContainer {
            parent_id: "doc".into(),
            layer: LayerName::Next,
        };
        assert!(missing.is_fatal());
        assert!(missing.to_string().contains("`doc`"));
        assert!(missing.to_string().contains("`next`"));

        let remote = MapError::RemoteOnly {
            operation: "check_in",
        };
        assert!(!remote.is_fatal());
        assert_eq!(
            remote.to_string(),
            "`check_in` is only available in remote mode"
        );
    }

    #[test]
    fn test_rejections_are_not_fatal() {
        let invalid = MapError::InvalidMove {
            from: Address::new("letters", None),
            to: Address::new("letters", Some("notes")),
            reason: "containers live at the root",
        };
        assert!(!invalid.is_fatal());
        assert_eq!(
            invalid.to_string(),
            "cannot move `letters` to `notes/letters`: containers live at the root"
        );

        let pending = MapError::PendingRemoval {
            address: Address::new("header", Some("letters")),
            resource_id: "h1".into(),
        };
        assert!(!pending.is_fatal());
        assert!(pending.to_string().contains("`h1`"));
    }
}

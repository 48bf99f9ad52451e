//! Layer names and per-mode layer stacks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named stage of durability.
///
/// Ordered from least to most authoritative-for-editing, which is also
/// the order layers are overlaid when computing the merged view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerName {
    /// Committed state (local mode) or the remote authority's last known state
    Base,
    /// Locally saved but not yet accepted by the remote authority
    Staged,
    /// In-session, unsaved edits
    Next,
}

/// Layer stack of a self-authoritative project.
pub const LOCAL_LAYERS: &[LayerName] = &[LayerName::Base, LayerName::Next];

/// Layer stack of a project backed by a remote authority.
pub const REMOTE_LAYERS: &[LayerName] = &[LayerName::Base, LayerName::Staged, LayerName::Next];

impl LayerName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Staged => "staged",
            Self::Next => "next",
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

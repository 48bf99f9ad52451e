//! Resource kind tag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a resource in the id map.
///
/// Serialized as the lowercase tag used by the project archive. Only
/// [`ResourceKind::Teidoc`] owns a nested namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Container document holding child resources.
    Teidoc,
    Text,
    Header,
    Facsimile,
    SourceDocument,
    Standoff,
    Image,
}

impl ResourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [ResourceKind; 7] = [
        Self::Teidoc,
        Self::Text,
        Self::Header,
        Self::Facsimile,
        Self::SourceDocument,
        Self::Standoff,
        Self::Image,
    ];

    /// Whether entries of this kind carry a nested `ids` mapping.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Teidoc)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teidoc => "teidoc",
            Self::Text => "text",
            Self::Header => "header",
            Self::Facsimile => "facsimile",
            Self::SourceDocument => "source-document",
            Self::Standoff => "standoff",
            Self::Image => "image",
        }
    }

    /// Parse a kind from its serialized tag.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Resource map data model.
//!
//! - [`ResourceMapNode`]: one entry (opaque id, kind, children for containers)
//! - [`IdMap`]: a scope's namespace, local id -> entry
//! - [`anchor`]: internal anchors stored as flat sibling entries

pub mod anchor;
mod kind;
mod node;

pub use anchor::{anchor_key, anchor_of, is_anchor_key};
pub use kind::ResourceKind;
pub use node::{IdMap, ResourceId, ResourceMapNode, from_json, to_json};

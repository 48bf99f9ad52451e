//! Resource addressing - the two ways every resource is named.
//!
//! A resource has an immutable opaque id ([`ResourceId`](crate::resource::ResourceId))
//! and a mutable `(parent, local id)` [`Address`]. This module maps between
//! the two over a snapshot of the id map; it holds no state of its own.
//!
//! ```text
//! resourceID  --resolve-->            (parent, local)
//! "parent/local#anchor"  --resolve_reference-->  resourceID
//! ```
//!
//! # Module Structure
//!
//! - [`resolve`]: Address resolver, scope lookup, reference parsing
//! - [`conflict`]: Duplicate identity detection

pub mod conflict;
mod resolve;

pub use conflict::{DuplicateId, find_duplicates, format_duplicates, print_duplicates};
pub use resolve::{
    Address, Reference, lookup, resolve, resolve_all, resolve_live, resolve_reference, scope,
};

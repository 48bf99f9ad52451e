//! Update broadcasting between the owner process and replica windows.
//!
//! Single writer, many read replicas:
//!
//! ```text
//!            requests (Envelope)               snapshots (MapUpdate)
//! replica ─────────────────────────► owner ─────────────────────────► all replicas
//!    ▲                                 │
//!    └──────────── MapReply ───────────┘
//! ```
//!
//! Each broadcast carries a correlation id. The replica that sent the
//! request recognizes its own echo and discards it; every other snapshot is
//! applied in delivery order.
//!
//! # Module Structure
//!
//! - [`message`]: Correlation ids, requests, replies, updates
//! - [`broadcaster`]: Digest-deduplicated fan-out
//! - [`owner`]: Request loop around the [`MapManager`](crate::manager::MapManager)
//! - [`replica`]: Read-only view with echo suppression

mod broadcaster;
mod message;
mod owner;
mod replica;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::manager::MapError;

pub use broadcaster::Broadcaster;
pub use message::{AnchorSpec, CorrelationId, Envelope, MapReply, MapRequest, MapUpdate};
pub use owner::MapOwner;
pub use replica::MapReplica;

/// Failures of the owner loop or a replica's channel.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The map is inconsistent; reload the project from the archive.
    #[error("id map corrupted: {0}")]
    Fatal(#[from] MapError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("map owner is no longer running")]
    Disconnected,
}

//! Layered id-map storage.
//!
//! ```text
//! next     in-session edits            (never persisted)
//!   ↑
//! staged   locally durable, awaiting the remote authority  (remote mode)
//!   ↑
//! base     committed / authority-accepted
//! ```
//!
//! # Module Structure
//!
//! - [`name`]: Layer names and per-mode stacks
//! - [`merge`]: Overlay algorithm producing the merged view
//! - [`slot`]: Entry + anchors moved as one unit
//! - [`store`]: The layers and the cached merged view

mod merge;
mod name;
mod slot;
mod store;

pub use merge::Tombstones;
pub use name::{LOCAL_LAYERS, LayerName, REMOTE_LAYERS};
pub use slot::Slot;
pub use store::LayeredStore;

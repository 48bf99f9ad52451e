//! Update broadcaster: fan merged-view snapshots out to listeners.

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender, unbounded};

use super::{CorrelationId, MapUpdate};
use crate::resource::IdMap;

/// Delivers every distinct merged view to all subscribed listeners.
#[derive(Debug, Default)]
pub struct Broadcaster {
    listeners: Vec<Sender<MapUpdate>>,
    /// Digest of the last snapshot sent (or primed)
    last_digest: Option<blake3::Hash>,
}

impl Broadcaster {
    /// Register a listener. Updates arrive in the order they were sent.
    pub fn subscribe(&mut self) -> Receiver<MapUpdate> {
        let (tx, rx) = unbounded();
        self.listeners.push(tx);
        rx
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Record `map` as already known to every listener.
    pub fn prime(&mut self, map: &IdMap) {
        self.last_digest = Some(digest(map));
    }

    /// Send `map` tagged with `correlation_id`.
    ///
    /// Returns `false` (and sends nothing) when the snapshot is identical to
    /// the last one sent.
    pub fn broadcast(&mut self, correlation_id: &CorrelationId, map: &Arc<IdMap>) -> bool {
        let hash = digest(map);
        if self.last_digest == Some(hash) {
            crate::debug!("broadcast"; "{} unchanged, skipped", correlation_id);
            return false;
        }
        self.last_digest = Some(hash);

        let update = MapUpdate {
            correlation_id: correlation_id.clone(),
            map_data: Arc::clone(map),
        };
        self.listeners.retain(|listener| match listener.send(update.clone()) {
            Ok(()) => true,
            Err(_) => {
                crate::debug!("broadcast"; "listener disconnected");
                false
            }
        });

        crate::debug!(
            "broadcast";
            "{} ({}) to {} listeners",
            correlation_id,
            &hash.to_hex()[..8],
            self.listener_count()
        );
        true
    }
}

/// Content digest of a merged view.
fn digest(map: &IdMap) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    // IdMap is ordered, so equal maps serialize identically.
    if serde_json::to_writer(&mut hasher, map).is_err() {
        return blake3::Hash::from_bytes([0; 32]);
    }
    hasher.finalize()
}

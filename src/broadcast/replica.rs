//! Read-only replica of the merged view, held by non-owner windows.

use std::sync::Arc;

use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use super::{BroadcastError, CorrelationId, Envelope, MapReply, MapRequest, MapUpdate};
use crate::address::{self, Address};
use crate::debug;
use crate::resource::{IdMap, ResourceId};

/// What [`MapReplica::apply_update`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateOutcome {
    /// Foreign change: the view was replaced.
    Applied,
    /// Echo of this replica's own request: discarded.
    Echo,
}

/// A window's view of the id map.
///
/// Never mutated locally: mutations are forwarded to the owner and the view
/// is replaced wholesale by snapshots.
pub struct MapReplica {
    origin: String,
    view: ArcSwap<IdMap>,
    /// Correlation id of the request awaiting its echo
    last_sent: Mutex<Option<CorrelationId>>,
    requests: Sender<Envelope>,
    updates: Receiver<MapUpdate>,
}

impl MapReplica {
    pub fn new(
        origin: impl Into<String>,
        view: Arc<IdMap>,
        requests: Sender<Envelope>,
        updates: Receiver<MapUpdate>,
    ) -> Self {
        Self {
            origin: origin.into(),
            view: ArcSwap::new(view),
            last_sent: Mutex::new(None),
            requests,
            updates,
        }
    }

    /// Current snapshot.
    pub fn view(&self) -> Arc<IdMap> {
        self.view.load_full()
    }

    pub fn address_of(&self, resource_id: &ResourceId) -> Option<Address> {
        address::resolve(resource_id, &self.view.load())
    }

    /// Forward a mutation to the owner and wait for its reply.
    ///
    /// Updates queued before the echo of this request are applied in order;
    /// the echo itself is discarded and the reply snapshot installed instead.
    /// Blocks until the owner loop (running elsewhere) answers.
    pub fn request(&self, request: MapRequest) -> Result<MapReply, BroadcastError> {
        let correlation_id = CorrelationId::fresh(&self.origin);
        *self.last_sent.lock() = Some(correlation_id.clone());

        let (reply_tx, reply_rx) = bounded(1);
        self.requests
            .send(Envelope {
                correlation_id,
                request,
                reply: Some(reply_tx),
            })
            .map_err(|_| BroadcastError::Disconnected)?;
        let reply = reply_rx.recv().map_err(|_| BroadcastError::Disconnected)?;

        if reply.broadcast {
            loop {
                let update = self
                    .updates
                    .recv()
                    .map_err(|_| BroadcastError::Disconnected)?;
                if self.apply_update(update) == UpdateOutcome::Echo {
                    break;
                }
            }
        } else {
            *self.last_sent.lock() = None;
        }

        self.view.store(Arc::clone(&reply.map_data));
        Ok(reply)
    }

    /// Apply an incoming snapshot.
    ///
    /// Precondition for deduplication: `last_sent` holds the id of the one
    /// request this replica is waiting on. A snapshot carrying that id is
    /// the echo of our own change and is discarded (clearing `last_sent`);
    /// any other snapshot replaces the view.
    fn apply_update(&self, update: MapUpdate) -> UpdateOutcome {
        let mut last_sent = self.last_sent.lock();
        if last_sent.as_ref() == Some(&update.correlation_id) {
            *last_sent = None;
            debug!("replica"; "{} discarded echo {}", self.origin, update.correlation_id);
            return UpdateOutcome::Echo;
        }

        self.view.store(update.map_data);
        debug!("replica"; "{} applied {}", self.origin, update.correlation_id);
        UpdateOutcome::Applied
    }
}

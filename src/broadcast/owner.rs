//! Owner loop: the one process that mutates the id map.
//!
//! Requests are applied strictly in arrival order. For each request the
//! owner tags the resulting broadcast with the requester's correlation id,
//! writes whatever the operation asks to persist, then replies.

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender, unbounded};

use super::{BroadcastError, Envelope, MapReplica, MapReply};
use crate::archive::{Archive, write_persists};
use crate::manager::MapManager;
use crate::{debug, log};

/// Single writer of a project's id map.
pub struct MapOwner {
    manager: MapManager,
    archive: Box<dyn Archive + Send>,
    requests: Receiver<Envelope>,
    sender: Sender<Envelope>,
}

impl MapOwner {
    pub fn new(manager: MapManager, archive: Box<dyn Archive + Send>) -> Self {
        let (sender, requests) = unbounded();
        Self {
            manager,
            archive,
            requests,
            sender,
        }
    }

    /// Connect a new replica window identified by `origin`.
    pub fn replica(&mut self, origin: impl Into<String>) -> MapReplica {
        let updates = self.manager.subscribe();
        let view = Arc::clone(self.manager.merged());
        MapReplica::new(origin, view, self.sender.clone(), updates)
    }

    /// Apply one request, persist its result and reply.
    ///
    /// Only fatal map errors are returned; everything else goes back to the
    /// requester.
    pub fn handle(&mut self, envelope: Envelope) -> Result<(), BroadcastError> {
        let Envelope {
            correlation_id,
            request,
            reply,
        } = envelope;
        let operation = request.name();

        self.manager.set_correlation(correlation_id.clone());
        let applied = self.manager.apply(request);
        self.manager.clear_correlation();

        let broadcast = self.manager.last_broadcast() == Some(&correlation_id);
        debug!("owner"; "{} {} (broadcast: {})", operation, correlation_id, broadcast);

        let mut fatal = None;
        let result = match applied {
            Ok(outcome) => match write_persists(self.archive.as_mut(), outcome.persists()) {
                Ok(()) => Ok(outcome),
                Err(e) => {
                    log!("error"; "{} {}: {}", operation, correlation_id, e);
                    Err(e.to_string())
                }
            },
            Err(e) => {
                let message = e.to_string();
                if e.is_fatal() {
                    log!("error"; "{} {}: {}", operation, correlation_id, message);
                    fatal = Some(e);
                }
                Err(message)
            }
        };

        if let Some(reply) = reply {
            let message = MapReply {
                correlation_id,
                result,
                broadcast,
                map_data: Arc::clone(self.manager.merged()),
            };
            if reply.send(message).is_err() {
                debug!("owner"; "requester left before the reply");
            }
        }

        match fatal {
            Some(e) => Err(BroadcastError::Fatal(e)),
            None => Ok(()),
        }
    }

    /// Serve requests until every external sender is dropped or a fatal
    /// error occurs. Returns the manager with its final state.
    pub fn run(mut self) -> Result<MapManager, BroadcastError> {
        // Only senders handed out keep the loop alive.
        let (closed, _) = unbounded();
        drop(std::mem::replace(&mut self.sender, closed));

        while let Ok(envelope) = self.requests.recv() {
            self.handle(envelope)?;
        }
        debug!("owner"; "all senders closed");
        Ok(self.manager)
    }
}

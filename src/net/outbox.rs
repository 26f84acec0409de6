//! Bounded, best-effort event delivery
//!
//! Each consumer gets its own bounded channel. A full queue drops the
//! message rather than blocking the producer: the simulation's liveness
//! always outranks guaranteed delivery of transient UI events.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use hashbrown::HashMap;
use uuid::Uuid;

use crate::net::protocol::ServerEvent;

/// Fan-out hub for the broadcast event stream
pub struct Outbox {
    consumers: HashMap<Uuid, Sender<ServerEvent>>,
    capacity: usize,
    /// Messages dropped because a consumer queue was full
    dropped: u64,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            consumers: HashMap::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Register a consumer and hand back its receiving end
    pub fn subscribe(&mut self, id: Uuid) -> Receiver<ServerEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.consumers.insert(id, tx);
        rx
    }

    pub fn unsubscribe(&mut self, id: Uuid) {
        self.consumers.remove(&id);
    }

    /// Deliver to every consumer, dropping on full queues and pruning
    /// disconnected ones.
    pub fn broadcast(&mut self, event: &ServerEvent) {
        let mut disconnected: Vec<Uuid> = Vec::new();
        for (&id, tx) in self.consumers.iter() {
            match tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped += 1;
                    tracing::trace!(consumer = %id, "event dropped: queue full");
                }
                Err(TrySendError::Disconnected(_)) => disconnected.push(id),
            }
        }
        for id in disconnected {
            self.consumers.remove(&id);
        }
    }

    /// Deliver to a single consumer, same drop semantics
    pub fn send_to(&mut self, id: Uuid, event: &ServerEvent) {
        let Some(tx) = self.consumers.get(&id) else {
            return;
        };
        match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {
                self.consumers.remove(&id);
            }
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

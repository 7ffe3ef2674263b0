//! The hub's subscriber registry: process-wide mutable state shared by
//! every connection task.
//!
//! Grounded on `hotaru_core::alias`'s parking_lot re-exports -- a
//! non-poisoning `RwLock` guards the map itself, while fan-out releases the
//! lock before writing to any subscriber (§5: "Fan-out holds no lock
//! across the network write").
//!
//! Unlike `heyu.hub.HubServer`, which keys subscribers by `id(client)`,
//! subscribers here are keyed by a monotonic connection id minted at
//! accept time (§9 "Subscriber identity").

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock as PRwLock;
use tokio::sync::mpsc::UnboundedSender;

/// A subscribed connection: its negotiated protocol version and a channel
/// into its writer task. Fan-out never writes to the socket directly --
/// it hands the encoded frame to the connection's own task over this
/// channel, so no two tasks ever touch one socket's write half.
struct Subscription {
    version: u8,
    sender: UnboundedSender<Bytes>,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: PRwLock<HashMap<u64, Subscription>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh connection id, unique for the lifetime of the
    /// registry.
    pub fn next_connection_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn subscribe(&self, id: u64, version: u8, sender: UnboundedSender<Bytes>) {
        self.subscribers.write().insert(id, Subscription { version, sender });
    }

    /// Idempotent: removing an id that isn't present is a no-op, matching
    /// `HubServer.unsubscribe`'s tolerance of double-unsubscription.
    pub fn unsubscribe(&self, id: u64) {
        self.subscribers.write().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Snapshots `(id, version, sender)` for every current subscriber.
    /// Callers must release any lock before writing -- this method already
    /// does, returning an owned `Vec`.
    pub fn snapshot(&self) -> Vec<(u64, u8, UnboundedSender<Bytes>)> {
        self.subscribers
            .read()
            .iter()
            .map(|(id, sub)| (*id, sub.version, sub.sender.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_then_unsubscribe_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let id = registry.next_connection_id();
        registry.subscribe(id, 0, tx);
        assert_eq!(registry.len(), 1);
        registry.unsubscribe(id);
        registry.unsubscribe(id);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn connection_ids_are_monotonic() {
        let registry = SubscriberRegistry::new();
        let a = registry.next_connection_id();
        let b = registry.next_connection_id();
        assert!(b > a);
    }
}

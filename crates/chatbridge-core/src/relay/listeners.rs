//! Live listener registry for raw fragment broadcast.
//!
//! Each listener owns a bounded queue. Broadcasting never waits: a fragment
//! is offered with `try_send`, and a listener whose queue is closed (the
//! connection went away) or full (the client stopped reading) is removed
//! from the registry. The remaining listeners still receive the fragment.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Receiving side of a registered listener.
#[derive(Debug)]
pub struct ListenerHandle {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<String>,
}

/// Outcome of a single broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug)]
pub struct ListenerRegistry {
    listeners: DashMap<Uuid, mpsc::Sender<String>>,
    buffer: usize,
}

impl ListenerRegistry {
    /// Create a registry whose listeners queue up to `buffer` fragments.
    pub fn new(buffer: usize) -> Self {
        Self {
            listeners: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Add a listener and hand back its receiving end.
    pub fn register(&self) -> ListenerHandle {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let id = Uuid::now_v7();
        self.listeners.insert(id, sender);
        tracing::debug!(listener_id = %id, active = self.listeners.len(), "Listener connected");
        ListenerHandle { id, receiver }
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unregister(&self, id: &Uuid) -> bool {
        let removed = self.listeners.remove(id).is_some();
        if removed {
            tracing::debug!(listener_id = %id, active = self.listeners.len(), "Listener disconnected");
        }
        removed
    }

    /// Offer a fragment to every listener, dropping the ones that fail.
    pub fn broadcast(&self, fragment: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();

        for entry in self.listeners.iter() {
            match entry.value().try_send(fragment.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Closed(_)) => failed.push((*entry.key(), "closed")),
                Err(TrySendError::Full(_)) => failed.push((*entry.key(), "stalled")),
            }
        }

        // Removal happens after iteration; DashMap shards are still locked inside it.
        for (id, reason) in failed {
            if self.listeners.remove(&id).is_some() {
                report.dropped += 1;
                tracing::warn!(listener_id = %id, reason, "Dropping live listener after failed send");
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.listeners.contains_key(id)
    }
}

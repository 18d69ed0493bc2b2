use crate::error::SinkError;
use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write handle for one open streaming connection.
///
/// `send` receives an already serialized JSON payload; framing it for the
/// wire is the sink's business. `close` must be safe to call more than once.
pub trait Sink: Send + Sync {
    fn send(&self, payload: &str) -> Result<(), SinkError>;
    fn close(&self);
}

pub type SseSender = UnboundedSender<Result<Event, Infallible>>;

/// Sink backed by the channel feeding an axum SSE response stream. Each
/// payload becomes one `data: <payload>\n\n` frame. Closing drops the sender,
/// which ends the response stream.
pub struct ChannelSink {
    sender: Mutex<Option<SseSender>>,
}

impl ChannelSink {
    pub fn new(sender: SseSender) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }
}

impl Sink for ChannelSink {
    fn send(&self, payload: &str) -> Result<(), SinkError> {
        let guard = self
            .sender
            .lock()
            .map_err(|e| SinkError::Write(e.to_string()))?;

        match guard.as_ref() {
            Some(sender) => sender
                .send(Ok(Event::default().data(payload)))
                .map_err(|_| SinkError::Closed),
            None => Err(SinkError::Closed),
        }
    }

    fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            guard.take();
        }
    }
}

/// One open streaming connection as held by the registry.
pub struct Subscriber {
    pub id: ConnectionId,
    pub sink: Box<dyn Sink>,
}

impl Subscriber {
    pub fn new(id: ConnectionId, sink: impl Sink + 'static) -> Self {
        Self {
            id,
            sink: Box::new(sink),
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Process-wide set of open subscribers, keyed by connection id.
///
/// Membership changes are atomic per id. `broadcast` works from a snapshot of
/// `Arc` handles so that no map lock is held while writing to sinks, and
/// prunes failed subscribers only after every push has been attempted.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Arc<Subscriber>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Insert a subscriber. An existing entry with the same id is replaced.
    /// Returns the stored handle, usable with `remove_instance`.
    pub fn add(&self, subscriber: Subscriber) -> Arc<Subscriber> {
        let id = subscriber.id.clone();
        let subscriber = Arc::new(subscriber);
        if self
            .connections
            .insert(id.clone(), Arc::clone(&subscriber))
            .is_some()
        {
            warn!("Replaced existing SSE subscriber with duplicate id {id}");
        }
        trace!("Added SSE subscriber {id}");
        subscriber
    }

    /// Remove the subscriber with this id. Absent ids are a no-op, so the
    /// disconnect path and the failed-write path may both call this.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<Subscriber>> {
        let removed = self.connections.remove(id).map(|(_, subscriber)| subscriber);
        if removed.is_some() {
            trace!("Removed SSE subscriber {id}");
        }
        removed
    }

    /// Remove `subscriber` only if it is still the entry stored under its id;
    /// a newer subscriber registered under the same id is left alone.
    pub fn remove_instance(&self, subscriber: &Arc<Subscriber>) -> bool {
        self.connections
            .remove_if(&subscriber.id, |_, current| Arc::ptr_eq(current, subscriber))
            .is_some()
    }

    /// Push one serialized payload to every current subscriber.
    ///
    /// Returns the number of subscribers held when the call started, before
    /// any failed subscriber is pruned. The count is advisory, not an ack.
    pub fn broadcast(&self, payload: &str) -> usize {
        let snapshot: Vec<Arc<Subscriber>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut failed = Vec::new();
        for subscriber in &snapshot {
            if let Err(e) = subscriber.sink.send(payload) {
                warn!(
                    "Failed to send broadcast to connection {}: {e}. Pruning it.",
                    subscriber.id
                );
                failed.push(subscriber);
            }
        }

        for subscriber in failed {
            if self.remove_instance(subscriber) {
                subscriber.sink.close();
            }
        }

        snapshot.len()
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Remove every subscriber and close its sink.
    pub fn clear(&self) -> usize {
        let ids: Vec<ConnectionId> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut closed = 0;
        for id in ids {
            if let Some(subscriber) = self.remove(&id) {
                subscriber.sink.close();
                closed += 1;
            }
        }
        closed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

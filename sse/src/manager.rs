use crate::connection::{ConnectionId, ConnectionRegistry, Sink, Subscriber};
use crate::error::Error;
use crate::message::Message;
use log::*;
use serde_json::Value;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Open a new subscription on `sink`.
    ///
    /// The `CONNECTED` handshake is written before the subscriber joins the
    /// registry, so no broadcast can reach the client ahead of it. The
    /// returned guard removes the subscriber and closes its sink when dropped.
    pub fn connect(&self, sink: impl Sink + 'static) -> Result<ConnectionGuard, Error> {
        let connection_id = ConnectionId::new();

        let handshake = Message::connected(connection_id.as_str()).to_json()?;
        sink.send(&handshake)?;

        let subscriber = self.registry.add(Subscriber::new(connection_id.clone(), sink));
        info!(
            "Registered new SSE connection {connection_id} ({} open)",
            self.registry.count()
        );

        Ok(ConnectionGuard {
            subscriber,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Remove a connection by id and close its sink. Safe to call for ids that
    /// are already gone.
    pub fn disconnect(&self, connection_id: &ConnectionId) {
        if let Some(subscriber) = self.registry.remove(connection_id) {
            subscriber.sink.close();
            info!(
                "Unregistered SSE connection {connection_id} ({} open)",
                self.registry.count()
            );
        }
    }

    /// Serialize `message` once and push it to every open connection.
    /// Returns the number of connections held when the broadcast started.
    pub fn broadcast(&self, message: &Message) -> Result<usize, Error> {
        let payload = message.to_json()?;
        let client_count = self.registry.broadcast(&payload);

        info!(
            "Broadcast {} to {client_count} SSE connection(s)",
            message.event_type
        );

        Ok(client_count)
    }

    /// Turn a caller-supplied event descriptor into a broadcast.
    ///
    /// A descriptor without a usable `type` is rejected before the registry is
    /// touched. Nothing else about the event is validated.
    pub fn trigger(&self, descriptor: Value) -> Result<usize, Error> {
        let message = Message::try_from(descriptor).inspect_err(|e| {
            warn!("Rejected broadcast trigger: {e}");
        })?;

        self.broadcast(&message)
    }

    pub fn client_count(&self) -> usize {
        self.registry.count()
    }

    /// Close every open connection and empty the registry.
    pub fn shutdown(&self) -> usize {
        let closed = self.registry.clear();
        info!("Closed {closed} SSE connection(s) for shutdown");
        closed
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Ties a subscriber's registry membership to a scope. Dropping the guard,
/// on any exit path, closes its sink and removes the subscriber it registered.
/// A different subscriber later stored under the same id is left in place.
pub struct ConnectionGuard {
    subscriber: Arc<Subscriber>,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionGuard {
    pub fn id(&self) -> &ConnectionId {
        &self.subscriber.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connection_id = &self.subscriber.id;
        debug!("SSE connection {connection_id} closed, cleaning up");

        self.subscriber.sink.close();
        if self.registry.remove_instance(&self.subscriber) {
            info!(
                "Unregistered SSE connection {connection_id} ({} open)",
                self.registry.count()
            );
        }
    }
}

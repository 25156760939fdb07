//! Live outbound channels, keyed by connection.

use crate::coordinator::Outbox;
use crate::protocol::Notification;
use crate::session::ConnectionId;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

/// Maps connection IDs to the sender half of each socket's writer queue.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    channels: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<Notification>>>,
}

impl ConnectionHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the queue its writer drains.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn register(&self, conn: ConnectionId) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn, tx);
        debug!("Registered outbound channel");
        rx
    }

    /// Drops a connection's channel; its writer ends once the queue drains.
    #[instrument(skip(self), fields(connection = %conn))]
    pub fn unregister(&self, conn: ConnectionId) {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&conn);
        debug!("Unregistered outbound channel");
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Outbox for ConnectionHub {
    fn deliver(&self, to: ConnectionId, notification: Notification) {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        match channels.get(&to) {
            Some(tx) => {
                if tx.send(notification).is_err() {
                    debug!(connection = %to, "Writer gone, dropping notification");
                }
            }
            None => trace!(connection = %to, "No channel for connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_routes_to_registered_connection() {
        let hub = ConnectionHub::new();
        let mut rx_a = hub.register(ConnectionId(1));
        let mut rx_b = hub.register(ConnectionId(2));

        let note = Notification::Error {
            message: "hello".to_string(),
        };
        hub.deliver(ConnectionId(2), note.clone());

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), note);
    }

    #[test]
    fn test_deliver_after_unregister_is_dropped() {
        let hub = ConnectionHub::new();
        let mut rx = hub.register(ConnectionId(7));
        hub.unregister(ConnectionId(7));
        assert!(hub.is_empty());

        hub.deliver(
            ConnectionId(7),
            Notification::Error {
                message: "late".to_string(),
            },
        );
        assert!(rx.try_recv().is_err());
    }
}

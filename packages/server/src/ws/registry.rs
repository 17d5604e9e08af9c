use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// A broadcast channel within one gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The global lobby every chat connection is subscribed to.
    Global,
    /// A team room, keyed by room ID.
    Room(i32),
}

struct Connection {
    user_id: i32,
    /// Outbound queue. The socket task forwards these frames to the client,
    /// so broadcasts never block on a slow peer.
    sender: mpsc::UnboundedSender<String>,
}

/// Live connections and their channel subscriptions for one gateway.
///
/// Cheap to clone; all clones share the same maps. Membership here is purely
/// about delivery fan-out. Authorization happens in the gateway handlers
/// against the database before a subscription is added.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, Connection>>,
    channels: Arc<DashMap<Channel, HashSet<ConnectionId>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection and return its ID.
    pub fn register(&self, user_id: i32, sender: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = Uuid::new_v4();
        self.connections.insert(id, Connection { user_id, sender });
        id
    }

    /// Remove a connection and all of its subscriptions.
    pub fn unregister(&self, id: ConnectionId) {
        self.connections.remove(&id);
        self.channels.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
    }

    /// Subscribe a connection to a channel. Returns false if the connection
    /// is no longer registered. Subscribing twice is a no-op.
    pub fn subscribe(&self, id: ConnectionId, channel: Channel) -> bool {
        if !self.connections.contains_key(&id) {
            return false;
        }
        self.channels.entry(channel).or_default().insert(id);
        true
    }

    /// Unsubscribe a connection from a channel. Idempotent.
    pub fn unsubscribe(&self, id: ConnectionId, channel: Channel) {
        if let Some(mut members) = self.channels.get_mut(&channel) {
            members.remove(&id);
        }
    }

    pub fn is_subscribed(&self, id: ConnectionId, channel: Channel) -> bool {
        self.channels
            .get(&channel)
            .is_some_and(|members| members.contains(&id))
    }

    pub fn user_id(&self, id: ConnectionId) -> Option<i32> {
        self.connections.get(&id).map(|c| c.user_id)
    }

    /// Channels this connection is currently subscribed to.
    pub fn subscriptions(&self, id: ConnectionId) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|entry| entry.value().contains(&id))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Send a frame to a single connection. Returns false if it is gone.
    pub fn send_to(&self, id: ConnectionId, frame: &str) -> bool {
        match self.connections.get(&id) {
            Some(conn) => conn.sender.send(frame.to_owned()).is_ok(),
            None => false,
        }
    }

    /// Send a frame to every subscriber of a channel. Returns the number of
    /// connections the frame was queued for.
    pub fn broadcast(&self, channel: Channel, frame: &str) -> usize {
        self.broadcast_inner(channel, None, frame)
    }

    /// Like [`broadcast`](Self::broadcast), but skips the sender's own
    /// connection. Used by the signaling relay.
    pub fn broadcast_except(&self, channel: Channel, except: ConnectionId, frame: &str) -> usize {
        self.broadcast_inner(channel, Some(except), frame)
    }

    fn broadcast_inner(
        &self,
        channel: Channel,
        except: Option<ConnectionId>,
        frame: &str,
    ) -> usize {
        let Some(members) = self.channels.get(&channel) else {
            return 0;
        };
        let mut delivered = 0;
        for id in members.iter() {
            if Some(*id) == except {
                continue;
            }
            if let Some(conn) = self.connections.get(id)
                && conn.sender.send(frame.to_owned()).is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }
}

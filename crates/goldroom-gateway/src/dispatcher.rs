use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::trace;
use uuid::Uuid;

use goldroom_types::events::{GatewayEvent, Table};

/// Capacity of the fan-out channel. Receivers that fall further behind
/// than this skip the missed events.
const BROADCAST_CAPACITY: usize = 1024;

/// What a single gateway connection wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub room_id: Uuid,
    pub tables: HashSet<Table>,
}

impl Subscription {
    pub fn new(room_id: Uuid, tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            room_id,
            tables: tables.into_iter().collect(),
        }
    }

    /// Row events match when both room and table are subscribed.
    /// Control events are never delivered through the broadcast path.
    pub fn matches(&self, event: &GatewayEvent) -> bool {
        match event.scope() {
            Some((room_id, table)) => room_id == self.room_id && self.tables.contains(&table),
            None => false,
        }
    }
}

/// Fans row-change events out to every connected gateway client.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// All connections receive all events and filter locally
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// conn_id -> current subscription
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                subscriptions: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        trace!("Broadcasting {:?}", event.scope());
        // No receivers is not an error: nobody is listening yet.
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Record or replace the subscription of a connection.
    pub async fn set_subscription(&self, conn_id: Uuid, subscription: Subscription) {
        self.inner
            .subscriptions
            .write()
            .await
            .insert(conn_id, subscription);
    }

    pub async fn subscription(&self, conn_id: Uuid) -> Option<Subscription> {
        self.inner.subscriptions.read().await.get(&conn_id).cloned()
    }

    pub async fn remove_connection(&self, conn_id: Uuid) {
        self.inner.subscriptions.write().await.remove(&conn_id);
    }

    /// Number of connections currently subscribed to a room.
    pub async fn subscriber_count(&self, room_id: Uuid) -> usize {
        self.inner
            .subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.room_id == room_id)
            .count()
    }
}

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{RwLock, mpsc};

use amoris_calls::CallStore;

use crate::{auth::ResolvedAuth, presence::PresenceRegistry, rooms::RoomRegistry,
    services::ProfileService};

// ── Connected client ─────────────────────────────────────────────────────────

/// A WebSocket connection currently attached to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: String,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    pub fn new(conn_id: String, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            conn_id,
            sender,
            connected_at: Instant::now(),
        }
    }

    /// Send a serialized JSON frame to this client. Delivery is
    /// fire-and-forget; a closed channel just returns false.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(frame.to_string()).is_ok()
    }
}

// ── Dedupe cache ─────────────────────────────────────────────────────────────

/// Simple TTL-based duplicate guard, keyed on arbitrary strings. Used to
/// collapse rapid repeated `startCall` events into one call record.
pub struct DedupeCache {
    entries: HashMap<String, Instant>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for DedupeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupeCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::from_millis(amoris_protocol::START_CALL_DEDUPE_TTL_MS),
            max_entries: amoris_protocol::START_CALL_DEDUPE_MAX_ENTRIES,
        }
    }

    /// Returns true if the key is a duplicate (already seen within TTL).
    pub fn check_and_insert(&mut self, key: &str) -> bool {
        self.evict_expired();
        if self.entries.contains_key(key) {
            return true;
        }
        if self.entries.len() >= self.max_entries {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, inserted)| **inserted)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key.to_string(), Instant::now());
        false
    }

    fn evict_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, inserted| now.duration_since(*inserted) < self.ttl);
    }
}

// ── Gateway state ────────────────────────────────────────────────────────────

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
///
/// Presence and room mutations happen synchronously under the write guard
/// (no await while it is held), so each registry change is atomic with
/// respect to every other event handler.
pub struct GatewayState {
    /// All connected WebSocket clients, keyed by conn_id.
    pub clients: RwLock<HashMap<String, ConnectedClient>>,
    /// user id → conn_id presence bindings.
    pub presence: RwLock<PresenceRegistry>,
    /// Chat-room subscriptions.
    pub rooms: RwLock<RoomRegistry>,
    /// Duplicate guard for startCall.
    pub dedupe: RwLock<DedupeCache>,
    /// Durable call records.
    pub calls: Arc<dyn CallStore>,
    /// Display-field resolution for the history routes.
    pub profiles: Arc<dyn ProfileService>,
    /// Token auth for the HTTP query surface.
    pub auth: ResolvedAuth,
    /// Server version string.
    pub version: String,
}

impl GatewayState {
    pub fn new(
        auth: ResolvedAuth,
        calls: Arc<dyn CallStore>,
        profiles: Arc<dyn ProfileService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            presence: RwLock::new(PresenceRegistry::new()),
            rooms: RwLock::new(RoomRegistry::new()),
            dedupe: RwLock::new(DedupeCache::new()),
            calls,
            profiles,
            auth,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Register a new client connection.
    pub async fn register_client(&self, client: ConnectedClient) {
        let conn_id = client.conn_id.clone();
        self.clients.write().await.insert(conn_id, client);
    }

    /// Remove a client by conn_id. Returns the removed client if found.
    pub async fn remove_client(&self, conn_id: &str) -> Option<ConnectedClient> {
        self.clients.write().await.remove(conn_id)
    }

    /// Number of connected clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }
}

use std::collections::{HashMap, HashSet};

/// Chat-room subscriptions: room id → member connections, with the reverse
/// map for disconnect cleanup. A room broadcast reaches every member,
/// including the sender's own connection.
pub struct RoomRegistry {
    rooms: HashMap<String, HashSet<String>>,
    by_conn: HashMap<String, HashSet<String>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            by_conn: HashMap::new(),
        }
    }

    pub fn join(&mut self, chat_id: &str, conn_id: &str) {
        self.rooms
            .entry(chat_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.by_conn
            .entry(conn_id.to_string())
            .or_default()
            .insert(chat_id.to_string());
    }

    /// Connections subscribed to a room. Empty when the room is unknown.
    pub fn members(&self, chat_id: &str) -> Vec<String> {
        self.rooms
            .get(chat_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every subscription held by this connection.
    pub fn leave_all(&mut self, conn_id: &str) {
        let Some(chat_ids) = self.by_conn.remove(conn_id) else {
            return;
        };
        for chat_id in chat_ids {
            if let Some(members) = self.rooms.get_mut(&chat_id) {
                members.remove(conn_id);
                if members.is_empty() {
                    self.rooms.remove(&chat_id);
                }
            }
        }
    }
}

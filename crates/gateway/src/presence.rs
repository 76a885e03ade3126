use std::collections::HashMap;

/// Ephemeral user-id → conn-id presence bindings.
///
/// One live binding per user: a repeated `join` for the same user rebinds to
/// the newest connection (last join wins). The reverse map keys cleanup on
/// disconnect. All methods are synchronous; callers hold the registry lock
/// only across the mutation and broadcast afterwards.
pub struct PresenceRegistry {
    /// user id → conn_id
    users: HashMap<String, String>,
    /// conn_id → user id (reverse lookup for disconnect)
    by_conn: HashMap<String, String>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            by_conn: HashMap::new(),
        }
    }

    /// Bind a user to a connection, replacing any prior binding for either
    /// the user or the connection. Returns the connection the user was
    /// previously bound to, if any.
    pub fn join(&mut self, user_id: &str, conn_id: &str) -> Option<String> {
        let old_conn = self.users.insert(user_id.to_string(), conn_id.to_string());
        if let Some(old_conn) = &old_conn {
            if old_conn != conn_id {
                self.by_conn.remove(old_conn);
            }
        }
        if let Some(old_user) = self.by_conn.insert(conn_id.to_string(), user_id.to_string()) {
            if old_user != user_id {
                self.users.remove(&old_user);
            }
        }
        old_conn.filter(|c| c != conn_id)
    }

    pub fn lookup(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(String::as_str)
    }

    /// Remove the binding owned by this connection, returning the freed
    /// user id if one was bound.
    pub fn remove_by_conn(&mut self, conn_id: &str) -> Option<String> {
        let user_id = self.by_conn.remove(conn_id)?;
        // Only clear the forward entry if it still points at this connection;
        // a later join may already have rebound the user elsewhere.
        if self.users.get(&user_id).is_some_and(|c| c == conn_id) {
            self.users.remove(&user_id);
        }
        Some(user_id)
    }

    /// Sorted list of online user ids (sorted for deterministic broadcasts).
    pub fn online_users(&self) -> Vec<String> {
        let mut users: Vec<_> = self.users.keys().cloned().collect();
        users.sort();
        users
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_then_lookup() {
        let mut registry = PresenceRegistry::new();
        registry.join("alice", "conn-1");
        assert_eq!(registry.lookup("alice"), Some("conn-1"));
        assert_eq!(registry.lookup("bob"), None);
    }

    #[test]
    fn last_join_wins() {
        let mut registry = PresenceRegistry::new();
        registry.join("alice", "conn-1");
        registry.join("alice", "conn-2");
        assert_eq!(registry.lookup("alice"), Some("conn-2"));

        // The stale connection no longer owns a binding.
        assert_eq!(registry.remove_by_conn("conn-1"), None);
        assert_eq!(registry.lookup("alice"), Some("conn-2"));
    }

    #[test]
    fn remove_by_conn_frees_the_user() {
        let mut registry = PresenceRegistry::new();
        registry.join("alice", "conn-1");
        assert_eq!(registry.remove_by_conn("conn-1"), Some("alice".into()));
        assert_eq!(registry.lookup("alice"), None);
        assert_eq!(registry.remove_by_conn("conn-1"), None);
    }

    #[test]
    fn rebinding_a_connection_to_a_new_user() {
        let mut registry = PresenceRegistry::new();
        registry.join("alice", "conn-1");
        registry.join("bob", "conn-1");
        assert_eq!(registry.lookup("alice"), None);
        assert_eq!(registry.lookup("bob"), Some("conn-1"));
        assert_eq!(registry.online_users(), vec!["bob".to_string()]);
    }

    #[test]
    fn online_users_is_sorted() {
        let mut registry = PresenceRegistry::new();
        registry.join("zoe", "conn-1");
        registry.join("amir", "conn-2");
        registry.join("lena", "conn-3");
        assert_eq!(registry.online_users(), vec!["amir", "lena", "zoe"]);
    }
}

//! Bearer-token identity for the HTTP query surface.
//!
//! Token issuance and verification belong to an external credential service;
//! the gateway only checks presented tokens against a configured map and
//! hands the resolved user id to the history routes.

use std::collections::HashMap;

/// Resolved token → user-id bindings.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAuth {
    tokens: HashMap<String, String>,
}

/// Constant-time string comparison (prevents timing attacks).
fn safe_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    // XOR each byte and accumulate; any difference makes result non-zero.
    let diff = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

impl ResolvedAuth {
    pub fn from_tokens(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Resolve a presented bearer token to a user id.
    pub fn identify(&self, presented: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(token, _)| safe_equal(token, presented))
            .map(|(_, user_id)| user_id.as_str())
    }

    /// Extract and resolve the token from an `Authorization: Bearer …` value.
    pub fn identify_header(&self, header: &str) -> Option<&str> {
        let token = header.strip_prefix("Bearer ")?;
        self.identify(token.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> ResolvedAuth {
        let mut tokens = HashMap::new();
        tokens.insert("tok-alice".to_string(), "alice".to_string());
        ResolvedAuth::from_tokens(tokens)
    }

    #[test]
    fn identifies_known_token() {
        assert_eq!(auth().identify("tok-alice"), Some("alice"));
        assert_eq!(auth().identify("tok-mallory"), None);
        assert_eq!(auth().identify(""), None);
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(auth().identify_header("Bearer tok-alice"), Some("alice"));
        assert_eq!(auth().identify_header("tok-alice"), None);
        assert_eq!(auth().identify_header("Basic dXNlcg=="), None);
    }

    #[test]
    fn safe_equal_basic_properties() {
        assert!(safe_equal("abc", "abc"));
        assert!(!safe_equal("abc", "abd"));
        assert!(!safe_equal("abc", "abcd"));
    }
}

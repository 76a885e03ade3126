use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AmorisConfig {
    pub gateway: GatewaySection,
    pub database: DatabaseSection,
    pub auth: AuthSection,
}

/// Bind address for the HTTP + WebSocket server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

/// Durable call-record storage. No URL means records are kept in memory
/// and lost on restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// sqlite URL, e.g. `sqlite://amoris.db`.
    pub url: Option<String>,
}

/// Static token → user-id map for the HTTP query surface. Stands in for the
/// external credential service that issues and verifies tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub tokens: HashMap<String, String>,
}

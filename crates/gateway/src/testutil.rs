//! Shared helpers for in-module gateway tests: a state with the in-memory
//! call store and channel-backed fake clients.

use std::{collections::HashMap, sync::Arc, time::Instant};

use tokio::sync::mpsc;

use {
    amoris_calls::MemoryCallStore,
    amoris_protocol::ServerEvent,
};

use crate::{
    auth::ResolvedAuth,
    services::NoopProfileService,
    state::{ConnectedClient, GatewayState},
};

pub fn test_state() -> Arc<GatewayState> {
    GatewayState::new(
        ResolvedAuth::from_tokens(HashMap::new()),
        Arc::new(MemoryCallStore::new()),
        Arc::new(NoopProfileService),
    )
}

/// Register a fake client and return the receiving end of its frame channel.
pub async fn attach_client(
    state: &Arc<GatewayState>,
    conn_id: &str,
) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .register_client(ConnectedClient {
            conn_id: conn_id.to_string(),
            sender: tx,
            connected_at: Instant::now(),
        })
        .await;
    rx
}

/// Pop the next already-delivered event, decoded. None when the queue is
/// empty.
pub fn next_event(rx: &mut mpsc::UnboundedReceiver<String>) -> Option<ServerEvent> {
    let frame = rx.try_recv().ok()?;
    serde_json::from_str(&frame).ok()
}

/// Drain all pending events for a connection.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Some(event) = next_event(rx) {
        events.push(event);
    }
    events
}

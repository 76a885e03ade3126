//! Notification dispatch for in-process collaborators.
//!
//! Other parts of the backend hand the gateway a payload for a user; if the
//! user has a live connection it arrives as a `newNotification` event,
//! otherwise it is dropped here and left to the durable notification store
//! upstream.

use {serde_json::Value, tracing::debug};

use {amoris_protocol::ServerEvent, crate::broadcast::send_to_user, crate::state::GatewayState};

/// Push a notification payload to a user's live connection, if any.
/// Returns whether it was delivered.
pub async fn push(state: &GatewayState, user_id: &str, payload: Value) -> bool {
    let delivered = send_to_user(state, user_id, &ServerEvent::NewNotification(payload)).await;
    if !delivered {
        debug!(user = %user_id, "notification not delivered, user offline");
    }
    delivered
}

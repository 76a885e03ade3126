//! Outbound event delivery: single connection, single user, room, or
//! everyone. All sends are fire-and-forget — no acknowledgment, no queueing,
//! no backpressure; a closed or missing target simply misses the event.

use tracing::warn;

use amoris_protocol::ServerEvent;

use crate::state::GatewayState;

fn encode(event: &ServerEvent) -> Option<String> {
    match event.encode() {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound event");
            None
        },
    }
}

/// Send an event to one connection. Returns false if the connection is gone.
pub async fn send_to_conn(state: &GatewayState, conn_id: &str, event: &ServerEvent) -> bool {
    let Some(frame) = encode(event) else {
        return false;
    };
    let clients = state.clients.read().await;
    clients.get(conn_id).is_some_and(|c| c.send(&frame))
}

/// Send an event to a user's bound connection, if the user is online.
pub async fn send_to_user(state: &GatewayState, user_id: &str, event: &ServerEvent) -> bool {
    let conn_id = {
        let presence = state.presence.read().await;
        presence.lookup(user_id).map(str::to_string)
    };
    match conn_id {
        Some(conn_id) => send_to_conn(state, &conn_id, event).await,
        None => false,
    }
}

/// Deliver an event to every connection subscribed to a chat room,
/// including the sender's own.
pub async fn broadcast_room(state: &GatewayState, chat_id: &str, event: &ServerEvent) {
    let Some(frame) = encode(event) else {
        return;
    };
    let members = {
        let rooms = state.rooms.read().await;
        rooms.members(chat_id)
    };
    let clients = state.clients.read().await;
    for conn_id in members {
        if let Some(client) = clients.get(&conn_id) {
            client.send(&frame);
        }
    }
}

/// Deliver an event to every connected client.
pub async fn broadcast_all(state: &GatewayState, event: &ServerEvent) {
    let Some(frame) = encode(event) else {
        return;
    };
    let clients = state.clients.read().await;
    for client in clients.values() {
        client.send(&frame);
    }
}

/// Push the full current set of online user ids to all connections.
/// Triggered on every presence change (join, rebind, disconnect).
pub async fn broadcast_online_users(state: &GatewayState) {
    let users = {
        let presence = state.presence.read().await;
        presence.online_users()
    };
    broadcast_all(state, &ServerEvent::OnlineUsers(users)).await;
}

#[cfg(test)]
mod tests {
    use amoris_protocol::ServerEvent;

    use crate::testutil::{attach_client, next_event, test_state};

    #[tokio::test]
    async fn send_to_conn_reaches_only_that_connection() {
        let state = test_state();
        let mut rx_a = attach_client(&state, "conn-a").await;
        let mut rx_b = attach_client(&state, "conn-b").await;

        let sent = super::send_to_conn(
            &state,
            "conn-a",
            &ServerEvent::CallError {
                message: "boom".into(),
            },
        )
        .await;
        assert!(sent);
        assert!(matches!(
            next_event(&mut rx_a),
            Some(ServerEvent::CallError { .. })
        ));
        assert!(next_event(&mut rx_b).is_none());
    }

    #[tokio::test]
    async fn send_to_unknown_conn_returns_false() {
        let state = test_state();
        let sent = super::send_to_conn(
            &state,
            "ghost",
            &ServerEvent::CallError {
                message: "boom".into(),
            },
        )
        .await;
        assert!(!sent);
    }

    #[tokio::test]
    async fn broadcast_online_users_reaches_everyone() {
        let state = test_state();
        let mut rx_a = attach_client(&state, "conn-a").await;
        let mut rx_b = attach_client(&state, "conn-b").await;
        state.presence.write().await.join("alice", "conn-a");

        super::broadcast_online_users(&state).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let Some(ServerEvent::OnlineUsers(users)) = next_event(rx) else {
                panic!("expected onlineUsers");
            };
            assert_eq!(users, vec!["alice"]);
        }
    }

    #[tokio::test]
    async fn room_broadcast_includes_the_sender() {
        let state = test_state();
        let mut rx_a = attach_client(&state, "conn-a").await;
        let mut rx_b = attach_client(&state, "conn-b").await;
        let mut rx_c = attach_client(&state, "conn-c").await;
        {
            let mut rooms = state.rooms.write().await;
            rooms.join("room-1", "conn-a");
            rooms.join("room-1", "conn-b");
        }

        super::broadcast_room(
            &state,
            "room-1",
            &ServerEvent::OnlineUsers(vec![]),
        )
        .await;

        assert!(next_event(&mut rx_a).is_some());
        assert!(next_event(&mut rx_b).is_some());
        assert!(next_event(&mut rx_c).is_none());
    }
}

//! Per-connection WebSocket loop.
//!
//! Each socket gets a uuid connection id, a registered outbound channel, and
//! a spawned write task, so any part of the gateway can push frames to it
//! without holding the socket. The read side decodes client events and
//! dispatches them; a malformed frame is logged and skipped, never fatal.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, StreamExt},
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
    uuid::Uuid,
};

use amoris_protocol::ClientEvent;

use crate::{
    broadcast::broadcast_online_users,
    calls, chat,
    state::{ConnectedClient, GatewayState},
};

pub async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>, addr: SocketAddr) {
    let conn_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task: everything the gateway sends this connection flows
    // through the channel and out here.
    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    state
        .register_client(ConnectedClient::new(conn_id.clone(), tx))
        .await;
    info!(conn = %conn_id, %addr, "client connected");

    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(conn = %conn_id, error = %e, "websocket read error");
                break;
            },
        };
        match frame {
            Message::Text(text) => match ClientEvent::decode(&text) {
                Ok(event) => dispatch_event(&state, &conn_id, event).await,
                Err(e) => {
                    warn!(conn = %conn_id, error = %e, "malformed client event dropped");
                },
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames have no meaning here.
            _ => {},
        }
    }

    disconnect(&state, &conn_id).await;
    write_task.abort();
}

async fn dispatch_event(state: &Arc<GatewayState>, conn_id: &str, event: ClientEvent) {
    match event {
        ClientEvent::JoinUser(user_id) => {
            let previous_conn = {
                let mut presence = state.presence.write().await;
                presence.join(&user_id, conn_id)
            };
            if let Some(previous_conn) = previous_conn {
                debug!(user = %user_id, old_conn = %previous_conn, "presence rebound to new connection");
            }
            info!(user = %user_id, conn = %conn_id, "user online");
            broadcast_online_users(state).await;
        },
        ClientEvent::JoinChat(chat_id) => {
            state.rooms.write().await.join(&chat_id, conn_id);
            debug!(conn = %conn_id, chat = %chat_id, "joined chat room");
        },
        ClientEvent::SendMessage(params) => chat::send_message(state, params).await,
        ClientEvent::StartCall(params) => calls::start_call(state, conn_id, params).await,
        ClientEvent::AnswerCall(params) => calls::answer_call(state, conn_id, params).await,
        ClientEvent::RejectCall(params) => calls::reject_call(state, conn_id, params).await,
        ClientEvent::EndCall(params) => calls::end_call(state, conn_id, params).await,
        ClientEvent::IceCandidate(params) => calls::ice_candidate(state, params).await,
    }
}

/// Tear down everything keyed by this connection. If the connection was
/// bound to a user's presence, the remaining clients get a fresh
/// `onlineUsers` snapshot.
async fn disconnect(state: &Arc<GatewayState>, conn_id: &str) {
    state.rooms.write().await.leave_all(conn_id);

    let went_offline = {
        let mut presence = state.presence.write().await;
        presence.remove_by_conn(conn_id)
    };

    state.remove_client(conn_id).await;

    if let Some(user_id) = went_offline {
        info!(user = %user_id, conn = %conn_id, "user offline");
        broadcast_online_users(state).await;
    } else {
        debug!(conn = %conn_id, "client disconnected");
    }
}

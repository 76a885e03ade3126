//! Chat message relay: fan a message out to its room and refresh the chat
//! list preview for both participants.
//!
//! The gateway is a relay, not a mailbox. Messages reach whoever is in the
//! room right now; durable chat storage lives elsewhere.

use std::sync::Arc;

use {chrono::Utc, tracing::debug};

use amoris_protocol::{ChatMessage, ChatPreview, SendMessageParams, ServerEvent};

use crate::{
    broadcast::{broadcast_room, send_to_user},
    state::GatewayState,
};

/// Stamp the message, relay it to the room, and push an `updateChatList`
/// preview to the sender and the receiver wherever they are online. Room
/// delivery includes the sender's own connection, which doubles as the
/// client's delivery confirmation.
pub async fn send_message(state: &Arc<GatewayState>, params: SendMessageParams) {
    let message = ChatMessage {
        chat_id: params.chat_id.clone(),
        sender: params.sender.clone(),
        receiver_id: params.receiver_id.clone(),
        content: params.content.clone(),
        timestamp: Utc::now(),
    };

    broadcast_room(
        state,
        &params.chat_id,
        &ServerEvent::ReceiveMessage(message.clone()),
    )
    .await;

    for user_id in [&params.sender, &params.receiver_id] {
        let sent_by_me = *user_id == params.sender;
        let delivered = send_to_user(state, user_id, &ServerEvent::UpdateChatList {
            chat_id: params.chat_id.clone(),
            last_message: ChatPreview {
                content: params.content.clone(),
                created_at: message.timestamp,
                sender: params.sender.clone(),
                sent_by_me,
                // The sender has trivially seen their own message; the
                // receiver's copy starts unseen.
                is_seen: sent_by_me,
            },
        })
        .await;
        if !delivered {
            debug!(user = %user_id, chat = %params.chat_id, "chat list update skipped, user offline");
        }
    }
}

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use amoris_calls::CallType;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("malformed event frame: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

// ── Chat payloads ────────────────────────────────────────────────────────────

/// A relayed chat message. Not persisted here; the server only stamps the
/// time and fans it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub chat_id: String,
    pub sender: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Chat-list preview pushed to each party after a message is relayed.
/// `is_seen` is provisional: the sender's own copy is marked seen, the
/// receiver's is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPreview {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender: String,
    pub sent_by_me: bool,
    pub is_seen: bool,
}

// ── Inbound event parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
    pub chat_id: String,
    pub sender: String,
    pub receiver_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallParams {
    pub from_user_id: String,
    pub to_user_id: String,
    /// Absent on the wire means an audio call.
    #[serde(default)]
    pub call_type: CallType,
    /// WebRTC offer SDP, opaque to the gateway.
    #[serde(default)]
    pub offer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerCallParams {
    pub call_id: String,
    pub from_user_id: String,
    /// Despite the name, this field carries the *original caller's* id — the
    /// answer travels back to whoever started the call. Kept as-is for
    /// client compatibility.
    pub to_user_id: String,
    /// WebRTC answer SDP, opaque to the gateway.
    #[serde(default)]
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectCallParams {
    pub call_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndCallParams {
    pub call_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidateParams {
    pub from_user_id: String,
    pub to_user_id: String,
    pub candidate: Value,
}

// ── Inbound events ───────────────────────────────────────────────────────────

/// Everything a client may send over the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Register presence for a user id (last join wins).
    JoinUser(String),
    /// Subscribe this connection to a chat room.
    JoinChat(String),
    SendMessage(SendMessageParams),
    StartCall(StartCallParams),
    AnswerCall(AnswerCallParams),
    RejectCall(RejectCallParams),
    EndCall(EndCallParams),
    IceCandidate(IceCandidateParams),
}

impl ClientEvent {
    pub fn decode(frame: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(frame)?)
    }
}

// ── Outbound events ──────────────────────────────────────────────────────────

/// Everything the gateway may push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full set of currently online user ids, sent on every presence change.
    OnlineUsers(Vec<String>),
    ReceiveMessage(ChatMessage),
    #[serde(rename_all = "camelCase")]
    UpdateChatList {
        chat_id: String,
        last_message: ChatPreview,
    },
    #[serde(rename_all = "camelCase")]
    IncomingCall {
        call_id: String,
        from_user_id: String,
        call_type: CallType,
        offer: Value,
    },
    #[serde(rename_all = "camelCase")]
    CallStarted { call_id: String, ringing: bool },
    #[serde(rename_all = "camelCase")]
    CallAnswered {
        call_id: String,
        from_user_id: String,
        answer: Value,
    },
    #[serde(rename_all = "camelCase")]
    CallRejected { call_id: String, by: String },
    #[serde(rename_all = "camelCase")]
    CallEnded { call_id: String, by: String },
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        from_user_id: String,
        candidate: Value,
    },
    CallError { message: String },
    NewNotification(Value),
}

impl ServerEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_join_user_frame() {
        let event = ClientEvent::decode(r#"{"event":"joinUser","data":"user-1"}"#).unwrap();
        assert_eq!(event, ClientEvent::JoinUser("user-1".into()));
    }

    #[test]
    fn decodes_start_call_with_defaults() {
        let frame = r#"{"event":"startCall","data":{"fromUserId":"a","toUserId":"b"}}"#;
        let ClientEvent::StartCall(params) = ClientEvent::decode(frame).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(params.call_type, CallType::Audio);
        assert!(params.offer.is_null());
    }

    #[test]
    fn decodes_answer_call_wire_names() {
        let frame = r#"{"event":"answerCall","data":{"callId":"c1","fromUserId":"b","toUserId":"a","answer":{"sdp":"x"}}}"#;
        let ClientEvent::AnswerCall(params) = ClientEvent::decode(frame).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(params.call_id, "c1");
        // to_user_id carries the original caller.
        assert_eq!(params.to_user_id, "a");
    }

    #[test]
    fn rejects_frame_with_missing_fields() {
        let frame = r#"{"event":"sendMessage","data":{"chatId":"room"}}"#;
        assert!(ClientEvent::decode(frame).is_err());
    }

    #[test]
    fn rejects_unknown_event_name() {
        assert!(ClientEvent::decode(r#"{"event":"selfDestruct","data":{}}"#).is_err());
    }

    #[test]
    fn encodes_call_started_shape() {
        let event = ServerEvent::CallStarted {
            call_id: "c1".into(),
            ringing: true,
        };
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"event": "callStarted", "data": {"callId": "c1", "ringing": true}})
        );
    }

    #[test]
    fn encodes_chat_preview_flags_in_camel_case() {
        let event = ServerEvent::UpdateChatList {
            chat_id: "room".into(),
            last_message: ChatPreview {
                content: "hi".into(),
                created_at: Utc::now(),
                sender: "a".into(),
                sent_by_me: true,
                is_seen: true,
            },
        };
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value["event"], "updateChatList");
        assert_eq!(value["data"]["lastMessage"]["sentByMe"], true);
        assert_eq!(value["data"]["lastMessage"]["isSeen"], true);
    }

    #[test]
    fn encodes_online_users_list() {
        let event = ServerEvent::OnlineUsers(vec!["a".into(), "b".into()]);
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"event": "onlineUsers", "data": ["a", "b"]}));
    }
}

//! Wire protocol for the realtime gateway.
//!
//! Every frame on the duplex connection is a JSON object
//! `{"event": <name>, "data": <payload>}`. Inbound frames decode into
//! [`ClientEvent`], outbound frames encode from [`ServerEvent`], so the set
//! of event kinds is closed and checked by the compiler instead of being
//! keyed on free-form strings.

pub mod events;

pub use events::{
    AnswerCallParams, ChatMessage, ChatPreview, ClientEvent, DecodeError, EndCallParams,
    IceCandidateParams, RejectCallParams, SendMessageParams, ServerEvent, StartCallParams,
};

pub const PROTOCOL_VERSION: u16 = 1;

/// How long a repeated `startCall` from the same caller to the same receiver
/// is treated as a duplicate of the first.
pub const START_CALL_DEDUPE_TTL_MS: u64 = 2_000;
pub const START_CALL_DEDUPE_MAX_ENTRIES: usize = 1_024;

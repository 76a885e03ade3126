//! Call session manager: owns the per-call state machine, mutates the
//! durable record, and decides which signaling events go to which party.
//!
//! Failure semantics: a store failure surfaces as a `callError` event to the
//! connection that initiated the transition. Signaling already sent for the
//! same transition is not retracted — the live signaling path and the
//! durable record are only best-effort consistent. An unreachable peer is
//! never an error; it selects the missed/silent-drop branch.

use std::sync::Arc;

use {chrono::Utc, tracing::{debug, info, warn}};

use {
    amoris_calls::{CallRecord, CallStatus},
    amoris_protocol::{
        AnswerCallParams, EndCallParams, IceCandidateParams, RejectCallParams, ServerEvent,
        StartCallParams,
    },
};

use crate::{
    broadcast::{send_to_conn, send_to_user},
    state::GatewayState,
};

async fn lookup_conn(state: &GatewayState, user_id: &str) -> Option<String> {
    let presence = state.presence.read().await;
    presence.lookup(user_id).map(str::to_string)
}

async fn call_error(state: &GatewayState, conn_id: &str, message: &str) {
    send_to_conn(state, conn_id, &ServerEvent::CallError {
        message: message.to_string(),
    })
    .await;
}

/// Create a call record and ring the receiver.
///
/// The record is persisted before any signaling (every event carries its
/// id). An offline receiver makes the call `missed` with no ringing phase —
/// a policy, not an error. A repeated startCall for the same caller/receiver
/// pair within the dedupe TTL is dropped without creating a record.
pub async fn start_call(state: &Arc<GatewayState>, conn_id: &str, params: StartCallParams) {
    let dedupe_key = format!("{}:{}", params.from_user_id, params.to_user_id);
    if state.dedupe.write().await.check_and_insert(&dedupe_key) {
        debug!(
            caller = %params.from_user_id,
            receiver = %params.to_user_id,
            "duplicate startCall suppressed"
        );
        return;
    }

    let receiver_conn = lookup_conn(state, &params.to_user_id).await;
    let status = if receiver_conn.is_some() {
        CallStatus::Ringing
    } else {
        CallStatus::Missed
    };
    let record = CallRecord::new(
        params.from_user_id.clone(),
        params.to_user_id.clone(),
        params.call_type,
        status,
    );

    if let Err(e) = state.calls.create(record.clone()).await {
        warn!(error = %e, caller = %params.from_user_id, "startCall persistence failed");
        call_error(state, conn_id, "Unable to start call").await;
        return;
    }

    if let Some(receiver_conn) = &receiver_conn {
        send_to_conn(state, receiver_conn, &ServerEvent::IncomingCall {
            call_id: record.id.clone(),
            from_user_id: params.from_user_id.clone(),
            call_type: params.call_type,
            offer: params.offer,
        })
        .await;
    }

    send_to_conn(state, conn_id, &ServerEvent::CallStarted {
        call_id: record.id.clone(),
        ringing: receiver_conn.is_some(),
    })
    .await;

    info!(
        call_id = %record.id,
        caller = %params.from_user_id,
        receiver = %params.to_user_id,
        ringing = receiver_conn.is_some(),
        "call started"
    );
}

/// Relay the answer back to the original caller and mark the record
/// accepted. The status write is unconditional; if it fails the signaling
/// stands and the answerer gets a `callError`.
pub async fn answer_call(state: &Arc<GatewayState>, conn_id: &str, params: AnswerCallParams) {
    // The wire's toUserId identifies the original caller.
    let original_caller = &params.to_user_id;

    if let Some(caller_conn) = lookup_conn(state, original_caller).await {
        send_to_conn(state, &caller_conn, &ServerEvent::CallAnswered {
            call_id: params.call_id.clone(),
            from_user_id: params.from_user_id.clone(),
            answer: params.answer.clone(),
        })
        .await;
    }

    match state.calls.set_status(&params.call_id, CallStatus::Accepted).await {
        Ok(()) => info!(call_id = %params.call_id, by = %params.from_user_id, "call answered"),
        Err(e) => {
            warn!(call_id = %params.call_id, error = %e, "answerCall persistence failed");
            call_error(state, conn_id, "Unable to answer call").await;
        },
    }
}

/// Notify the other party and close the record as rejected.
pub async fn reject_call(state: &Arc<GatewayState>, conn_id: &str, params: RejectCallParams) {
    if let Some(other_conn) = lookup_conn(state, &params.to_user_id).await {
        send_to_conn(state, &other_conn, &ServerEvent::CallRejected {
            call_id: params.call_id.clone(),
            by: params.from_user_id.clone(),
        })
        .await;
    }

    match state
        .calls
        .finish(&params.call_id, CallStatus::Rejected, Utc::now(), 0)
        .await
    {
        Ok(()) => info!(call_id = %params.call_id, by = %params.from_user_id, "call rejected"),
        Err(e) => {
            warn!(call_id = %params.call_id, error = %e, "rejectCall persistence failed");
            call_error(state, conn_id, "Unable to reject call").await;
        },
    }
}

/// End a call from either side. Both the other party and the ender's own
/// connection get `callEnded`, so the initiating client can reset its UI
/// too. The first end sets `ended_at`, computes the duration, and settles
/// the status (`missed` if it never left ringing); a repeat is a no-op
/// against the record.
pub async fn end_call(state: &Arc<GatewayState>, conn_id: &str, params: EndCallParams) {
    let ended_event = ServerEvent::CallEnded {
        call_id: params.call_id.clone(),
        by: params.from_user_id.clone(),
    };
    send_to_user(state, &params.to_user_id, &ended_event).await;
    send_to_user(state, &params.from_user_id, &ended_event).await;

    let record = match state.calls.get(&params.call_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(call_id = %params.call_id, "endCall for unknown record");
            return;
        },
        Err(e) => {
            warn!(call_id = %params.call_id, error = %e, "endCall record fetch failed");
            call_error(state, conn_id, "Unable to end call").await;
            return;
        },
    };

    if record.ended_at.is_some() {
        debug!(call_id = %params.call_id, "call already ended");
        return;
    }

    let ended_at = Utc::now();
    let duration_sec = record.elapsed_secs(ended_at);
    let status = if record.status == CallStatus::Ringing {
        CallStatus::Missed
    } else {
        CallStatus::Ended
    };

    match state
        .calls
        .finish(&params.call_id, status, ended_at, duration_sec)
        .await
    {
        Ok(()) => info!(
            call_id = %params.call_id,
            by = %params.from_user_id,
            status = status.as_str(),
            duration_sec,
            "call ended"
        ),
        Err(e) => {
            warn!(call_id = %params.call_id, error = %e, "endCall persistence failed");
            call_error(state, conn_id, "Unable to end call").await;
        },
    }
}

/// Pure relay of an ICE candidate. No record involved; an offline target
/// means the candidate is silently dropped — no buffering, no retry.
pub async fn ice_candidate(state: &Arc<GatewayState>, params: IceCandidateParams) {
    let delivered = send_to_user(state, &params.to_user_id, &ServerEvent::IceCandidate {
        from_user_id: params.from_user_id.clone(),
        candidate: params.candidate,
    })
    .await;
    if !delivered {
        debug!(target = %params.to_user_id, "ice candidate dropped, target offline");
    }
}

//! Call-history HTTP routes.
//!
//! Both routes require a bearer token that maps to a user id; the history is
//! always scoped to that user. `/api/call/all` additionally resolves the
//! participants' display fields through the `ProfileService` seam.

use {
    axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        response::{IntoResponse, Json},
    },
    serde::Serialize,
    serde_json::json,
    tracing::warn,
};

use amoris_calls::CallRecord;

use crate::{server::AppState, services::ProfileFields};

/// A call record with its participants expanded for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCallRecord {
    #[serde(flatten)]
    pub record: CallRecord,
    pub caller_profile: Participant,
    pub receiver_profile: Participant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "invalid or missing token"})),
    )
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    state
        .gateway
        .auth
        .identify_header(header)
        .map(str::to_string)
}

/// `GET /api/call/history/{partner_id}` — calls between the authenticated
/// user and one partner, newest first.
pub async fn call_history_handler(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized().into_response();
    };

    match state.gateway.calls.history_between(&user_id, &partner_id).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            warn!(user = %user_id, partner = %partner_id, error = %e, "call history query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "failed to load call history"})),
            )
                .into_response()
        },
    }
}

/// `GET /api/call/all` — every call involving the authenticated user,
/// newest first, with both participants resolved to display fields.
pub async fn call_history_all_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized().into_response();
    };

    let records = match state.gateway.calls.history_for(&user_id).await {
        Ok(records) => records,
        Err(e) => {
            warn!(user = %user_id, error = %e, "call history query failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "failed to load call history"})),
            )
                .into_response();
        },
    };

    let mut enriched = Vec::with_capacity(records.len());
    for record in records {
        let caller_fields = state.gateway.profiles.display_fields(&record.caller).await;
        let receiver_fields = state.gateway.profiles.display_fields(&record.receiver).await;
        let caller_id = record.caller.clone();
        let receiver_id = record.receiver.clone();
        enriched.push(EnrichedCallRecord {
            record,
            caller_profile: Participant {
                id: caller_id,
                fields: caller_fields,
            },
            receiver_profile: Participant {
                id: receiver_id,
                fields: receiver_fields,
            },
        });
    }

    Json(enriched).into_response()
}

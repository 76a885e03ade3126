use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CallId = String;

// ── Call type ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    #[default]
    Audio,
    Video,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Audio => "audio",
            CallType::Video => "video",
        }
    }
}

impl std::str::FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(CallType::Audio),
            "video" => Ok(CallType::Video),
            other => Err(format!("unknown call type: {other}")),
        }
    }
}

// ── Call status ──────────────────────────────────────────────────────────────

/// Lifecycle status of a call. `Rejected`, `Missed`, and `Ended` are
/// terminal; transitions are monotonic toward a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Ringing,
    Accepted,
    Rejected,
    Missed,
    Ended,
}

impl CallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallStatus::Rejected | CallStatus::Missed | CallStatus::Ended
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Ringing => "ringing",
            CallStatus::Accepted => "accepted",
            CallStatus::Rejected => "rejected",
            CallStatus::Missed => "missed",
            CallStatus::Ended => "ended",
        }
    }
}

impl std::str::FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ringing" => Ok(CallStatus::Ringing),
            "accepted" => Ok(CallStatus::Accepted),
            "rejected" => Ok(CallStatus::Rejected),
            "missed" => Ok(CallStatus::Missed),
            "ended" => Ok(CallStatus::Ended),
            other => Err(format!("unknown call status: {other}")),
        }
    }
}

// ── Call record ──────────────────────────────────────────────────────────────

/// One call between two users, as persisted by the call store.
///
/// Invariants: `ended_at` is set exactly once, by the first terminal write
/// that closes the call; `duration_sec` is meaningful only once `ended_at`
/// is set. `started_at` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: CallId,
    pub caller: String,
    pub receiver: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub status: CallStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_sec: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn new(
        caller: impl Into<String>,
        receiver: impl Into<String>,
        call_type: CallType,
        status: CallStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            caller: caller.into(),
            receiver: receiver.into(),
            call_type,
            status,
            started_at: now,
            ended_at: None,
            duration_sec: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole elapsed seconds between `started_at` and `ended_at`, floored.
    /// Clamped at zero in case of clock skew between the two writes.
    pub fn elapsed_secs(&self, ended_at: DateTime<Utc>) -> i64 {
        (ended_at - self.started_at).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!CallStatus::Ringing.is_terminal());
        assert!(!CallStatus::Accepted.is_terminal());
        assert!(CallStatus::Rejected.is_terminal());
        assert!(CallStatus::Missed.is_terminal());
        assert!(CallStatus::Ended.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            CallStatus::Ringing,
            CallStatus::Accepted,
            CallStatus::Rejected,
            CallStatus::Missed,
            CallStatus::Ended,
        ] {
            assert_eq!(status.as_str().parse::<CallStatus>(), Ok(status));
        }
        assert!("hold".parse::<CallStatus>().is_err());
    }

    #[test]
    fn call_type_defaults_to_audio() {
        assert_eq!(CallType::default(), CallType::Audio);
    }

    #[test]
    fn elapsed_secs_floors_subsecond_remainder() {
        let record = CallRecord::new("a", "b", CallType::Video, CallStatus::Ringing);
        let ended = record.started_at + Duration::milliseconds(30_900);
        assert_eq!(record.elapsed_secs(ended), 30);
    }

    #[test]
    fn elapsed_secs_clamps_negative_to_zero() {
        let record = CallRecord::new("a", "b", CallType::Audio, CallStatus::Ringing);
        let ended = record.started_at - Duration::seconds(5);
        assert_eq!(record.elapsed_secs(ended), 0);
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let record = CallRecord::new("alice", "bob", CallType::Video, CallStatus::Ringing);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["status"], "ringing");
        assert!(value["startedAt"].is_string());
        assert!(value["endedAt"].is_null());
        assert_eq!(value["durationSec"], 0);
    }
}

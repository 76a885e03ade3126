use std::collections::HashMap;

use {async_trait::async_trait, chrono::DateTime, chrono::Utc, tokio::sync::RwLock};

use crate::record::{CallId, CallRecord, CallStatus};

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum CallStoreError {
    #[error("call not found: {0}")]
    NotFound(CallId),
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for CallStoreError {
    fn from(err: sqlx::Error) -> Self {
        CallStoreError::Database(err.to_string())
    }
}

// ── Store trait ──────────────────────────────────────────────────────────────

/// Storage boundary for call records.
///
/// Writes are plain read-modify-write with no transactional isolation; the
/// `finish` guard on `ended_at` is best-effort idempotency, not a
/// compare-and-swap.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn create(&self, record: CallRecord) -> Result<(), CallStoreError>;

    async fn get(&self, id: &str) -> Result<Option<CallRecord>, CallStoreError>;

    /// Overwrite the status of an existing record, terminal or not.
    async fn set_status(&self, id: &str, status: CallStatus) -> Result<(), CallStoreError>;

    /// Close a call: set status, `ended_at`, and `duration_sec` in one write.
    /// A record whose `ended_at` is already set is left untouched.
    async fn finish(
        &self,
        id: &str,
        status: CallStatus,
        ended_at: DateTime<Utc>,
        duration_sec: i64,
    ) -> Result<(), CallStoreError>;

    /// Calls between the two users, in either direction, newest first.
    async fn history_between(&self, a: &str, b: &str)
    -> Result<Vec<CallRecord>, CallStoreError>;

    /// All calls involving the user, newest first.
    async fn history_for(&self, user: &str) -> Result<Vec<CallRecord>, CallStoreError>;
}

// ── In-memory store ──────────────────────────────────────────────────────────

/// Call store backed by a map. Used in tests and when the gateway runs
/// without a database.
#[derive(Default)]
pub struct MemoryCallStore {
    records: RwLock<HashMap<CallId, CallRecord>>,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_newest_first(records: &mut [CallRecord]) {
    records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
}

#[async_trait]
impl CallStore for MemoryCallStore {
    async fn create(&self, record: CallRecord) -> Result<(), CallStoreError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CallRecord>, CallStoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn set_status(&self, id: &str, status: CallStatus) -> Result<(), CallStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| CallStoreError::NotFound(id.to_string()))?;
        record.status = status;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn finish(
        &self,
        id: &str,
        status: CallStatus,
        ended_at: DateTime<Utc>,
        duration_sec: i64,
    ) -> Result<(), CallStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| CallStoreError::NotFound(id.to_string()))?;
        if record.ended_at.is_some() {
            return Ok(());
        }
        record.status = status;
        record.ended_at = Some(ended_at);
        record.duration_sec = duration_sec;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn history_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<CallRecord>, CallStoreError> {
        let records = self.records.read().await;
        let mut out: Vec<_> = records
            .values()
            .filter(|r| {
                (r.caller == a && r.receiver == b) || (r.caller == b && r.receiver == a)
            })
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn history_for(&self, user: &str) -> Result<Vec<CallRecord>, CallStoreError> {
        let records = self.records.read().await;
        let mut out: Vec<_> = records
            .values()
            .filter(|r| r.caller == user || r.receiver == user)
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::record::CallType;

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryCallStore::new();
        let record = CallRecord::new("a", "b", CallType::Audio, CallStatus::Ringing);
        let id = record.id.clone();
        store.create(record.clone()).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn set_status_on_missing_record_is_not_found() {
        let store = MemoryCallStore::new();
        let err = store.set_status("nope", CallStatus::Accepted).await.unwrap_err();
        assert!(matches!(err, CallStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn finish_sets_fields_once() {
        let store = MemoryCallStore::new();
        let record = CallRecord::new("a", "b", CallType::Audio, CallStatus::Accepted);
        let id = record.id.clone();
        store.create(record).await.unwrap();

        let ended = Utc::now();
        store.finish(&id, CallStatus::Ended, ended, 30).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CallStatus::Ended);
        assert_eq!(fetched.ended_at, Some(ended));
        assert_eq!(fetched.duration_sec, 30);

        // Second finish is a no-op: the first terminal write wins.
        let later = ended + Duration::seconds(10);
        store.finish(&id, CallStatus::Missed, later, 99).await.unwrap();
        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CallStatus::Ended);
        assert_eq!(fetched.ended_at, Some(ended));
        assert_eq!(fetched.duration_sec, 30);
    }

    #[tokio::test]
    async fn history_filters_and_orders_newest_first() {
        let store = MemoryCallStore::new();

        let mut first = CallRecord::new("a", "b", CallType::Audio, CallStatus::Ended);
        first.started_at = Utc::now() - Duration::minutes(10);
        let mut second = CallRecord::new("b", "a", CallType::Video, CallStatus::Missed);
        second.started_at = Utc::now() - Duration::minutes(5);
        let unrelated = CallRecord::new("a", "c", CallType::Audio, CallStatus::Ended);

        store.create(first.clone()).await.unwrap();
        store.create(second.clone()).await.unwrap();
        store.create(unrelated.clone()).await.unwrap();

        let between = store.history_between("a", "b").await.unwrap();
        assert_eq!(between.len(), 2);
        assert_eq!(between[0].id, second.id);
        assert_eq!(between[1].id, first.id);

        let all = store.history_for("a").await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, unrelated.id);
    }
}

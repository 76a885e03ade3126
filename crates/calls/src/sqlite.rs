//! SQLite-backed call store.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::{
        Row,
        sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    },
    tracing::debug,
};

use crate::{
    record::{CallRecord, CallStatus},
    store::{CallStore, CallStoreError},
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS calls (
    id           TEXT PRIMARY KEY,
    caller       TEXT NOT NULL,
    receiver     TEXT NOT NULL,
    call_type    TEXT NOT NULL,
    status       TEXT NOT NULL,
    started_at   TEXT NOT NULL,
    ended_at     TEXT,
    duration_sec INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_calls_caller ON calls(caller, started_at);
CREATE INDEX IF NOT EXISTS idx_calls_receiver ON calls(receiver, started_at);
"#;

pub struct SqliteCallStore {
    pool: SqlitePool,
}

impl SqliteCallStore {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, CallStoreError> {
        let options: SqliteConnectOptions = url
            .parse::<SqliteConnectOptions>()
            .map_err(|e| CallStoreError::Database(e.to_string()))?
            .create_if_missing(true);

        // An in-memory sqlite database exists per connection, so pin the
        // pool to one connection for those URLs.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        debug!(url, "call store ready");
        Ok(Self { pool })
    }
}

fn row_to_record(row: &SqliteRow) -> Result<CallRecord, CallStoreError> {
    let call_type: String = row.try_get("call_type")?;
    let status: String = row.try_get("status")?;
    Ok(CallRecord {
        id: row.try_get("id")?,
        caller: row.try_get("caller")?,
        receiver: row.try_get("receiver")?,
        call_type: call_type.parse().map_err(CallStoreError::Database)?,
        status: status.parse().map_err(CallStoreError::Database)?,
        started_at: row.try_get("started_at")?,
        ended_at: row.try_get("ended_at")?,
        duration_sec: row.try_get("duration_sec")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn rows_to_records(rows: &[SqliteRow]) -> Result<Vec<CallRecord>, CallStoreError> {
    rows.iter().map(row_to_record).collect()
}

#[async_trait]
impl CallStore for SqliteCallStore {
    async fn create(&self, record: CallRecord) -> Result<(), CallStoreError> {
        sqlx::query(
            "INSERT INTO calls \
             (id, caller, receiver, call_type, status, started_at, ended_at, duration_sec, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.caller)
        .bind(&record.receiver)
        .bind(record.call_type.as_str())
        .bind(record.status.as_str())
        .bind(record.started_at)
        .bind(record.ended_at)
        .bind(record.duration_sec)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CallRecord>, CallStoreError> {
        let row = sqlx::query("SELECT * FROM calls WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn set_status(&self, id: &str, status: CallStatus) -> Result<(), CallStoreError> {
        let result = sqlx::query("UPDATE calls SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CallStoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn finish(
        &self,
        id: &str,
        status: CallStatus,
        ended_at: DateTime<Utc>,
        duration_sec: i64,
    ) -> Result<(), CallStoreError> {
        let result = sqlx::query(
            "UPDATE calls SET status = ?, ended_at = ?, duration_sec = ?, updated_at = ? \
             WHERE id = ? AND ended_at IS NULL",
        )
        .bind(status.as_str())
        .bind(ended_at)
        .bind(duration_sec)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either already finished (fine) or missing (an error).
            if self.get(id).await?.is_none() {
                return Err(CallStoreError::NotFound(id.to_string()));
            }
        }
        Ok(())
    }

    async fn history_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Vec<CallRecord>, CallStoreError> {
        let rows = sqlx::query(
            "SELECT * FROM calls \
             WHERE (caller = ? AND receiver = ?) OR (caller = ? AND receiver = ?) \
             ORDER BY started_at DESC",
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.pool)
        .await?;
        rows_to_records(&rows)
    }

    async fn history_for(&self, user: &str) -> Result<Vec<CallRecord>, CallStoreError> {
        let rows = sqlx::query(
            "SELECT * FROM calls WHERE caller = ? OR receiver = ? ORDER BY started_at DESC",
        )
        .bind(user)
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        rows_to_records(&rows)
    }
}

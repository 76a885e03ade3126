//! Durable call records and their storage.
//!
//! A `CallRecord` tracks one call's lifecycle: created at `start`, driven
//! through the ringing/accepted states by the gateway's call session manager,
//! and closed exactly once (`ended_at` is set on the first terminal write and
//! never overwritten). Storage sits behind the `CallStore` trait with two
//! implementations: SQLite (production) and in-memory (tests, or running
//! without a database).

pub mod record;
pub mod sqlite;
pub mod store;

pub use record::{CallId, CallRecord, CallStatus, CallType};
pub use sqlite::SqliteCallStore;
pub use store::{CallStore, CallStoreError, MemoryCallStore};

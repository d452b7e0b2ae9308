//! Error types shared by the SQLite storage implementation.

use thiserror::Error;

/// Convenient result alias returning [`SqliteDaoError`] failures.
pub type SqliteResult<T> = Result<T, SqliteDaoError>;

/// Failures that can occur while interacting with SQLite.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The database file could not be opened.
    #[error("failed to open SQLite database `{path}`")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Creating or migrating the schema failed.
    #[error("failed to prepare SQLite schema ({step})")]
    Schema {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed while executing the named operation.
    #[error("SQLite query failed during `{op}`")]
    Query {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    /// The draft payload could not be serialized.
    #[error("failed to serialize draft snapshot")]
    EncodeDraft {
        #[source]
        source: serde_json::Error,
    },
    /// The shared connection mutex was poisoned by a panicking writer.
    #[error("SQLite connection lock poisoned during `{op}`")]
    Poisoned { op: &'static str },
    /// The blocking worker running the operation did not complete.
    #[error("SQLite worker for `{op}` did not complete")]
    Worker {
        op: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

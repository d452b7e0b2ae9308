mod draft;
mod error;
mod ledger;
mod schema;

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use tokio::task;
use tracing::info;

pub use draft::SqliteDraftStore;
pub use error::{SqliteDaoError, SqliteResult};
pub use ledger::SqliteRoundLedger;

use crate::dao::storage::StorageError;

impl From<SqliteDaoError> for StorageError {
    fn from(err: SqliteDaoError) -> Self {
        match err {
            SqliteDaoError::EncodeDraft { .. } => StorageError::decode(err.to_string(), err),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

/// Shared handle to one SQLite database file holding drafts and the ledger.
///
/// Statements run on the blocking pool; the connection is serialized behind a
/// mutex so the draft store and the ledger can share it.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Open (or create) the database file and bring the schema up to date.
    pub fn open(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| SqliteDaoError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let database = Self::from_connection(conn)?;
        info!(path = %path.display(), "opened SQLite database");
        Ok(database)
    }

    /// Open a private in-memory database, mostly useful in tests.
    pub fn open_in_memory() -> SqliteResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| SqliteDaoError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> SqliteResult<Self> {
        schema::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Draft store backed by this database.
    pub fn draft_store(&self) -> SqliteDraftStore {
        SqliteDraftStore::new(self.clone())
    }

    /// Round ledger backed by this database.
    pub fn round_ledger(&self) -> SqliteRoundLedger {
        SqliteRoundLedger::new(self.clone())
    }

    /// Run `work` against the connection on the blocking pool.
    pub(crate) async fn run<T, F>(&self, op: &'static str, work: F) -> SqliteResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> SqliteResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| SqliteDaoError::Poisoned { op })?;
            work(&mut guard)
        })
        .await
        .map_err(|source| SqliteDaoError::Worker { op, source })?
    }
}

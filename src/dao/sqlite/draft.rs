use futures::future::BoxFuture;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, warn};

use crate::{
    dao::{
        draft_store::{DRAFT_SLOT_KEY, DraftStore},
        models::{SNAPSHOT_VERSION, Snapshot},
        storage::StorageResult,
    },
    state::snapshot::now_millis,
};

use super::{
    SqliteDatabase,
    error::{SqliteDaoError, SqliteResult},
};

/// Draft slot stored as one JSON row in `active_rounds`.
#[derive(Clone)]
pub struct SqliteDraftStore {
    database: SqliteDatabase,
}

impl SqliteDraftStore {
    /// Draft store over the shared database handle.
    pub fn new(database: SqliteDatabase) -> Self {
        Self { database }
    }

    async fn write(&self, mut snapshot: Snapshot) -> SqliteResult<()> {
        let updated_at = now_millis();
        snapshot.version = SNAPSHOT_VERSION;
        snapshot.updated_at = updated_at;
        let payload = serde_json::to_string(&snapshot)
            .map_err(|source| SqliteDaoError::EncodeDraft { source })?;

        self.database
            .run("save_draft", move |conn| {
                conn.execute(
                    "REPLACE INTO active_rounds (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    params![DRAFT_SLOT_KEY, payload, updated_at],
                )
                .map_err(|source| SqliteDaoError::Query {
                    op: "save_draft",
                    source,
                })?;
                Ok(())
            })
            .await?;
        debug!(round_id = ?snapshot.round_id, updated_at, "draft saved");
        Ok(())
    }

    async fn read(&self) -> SqliteResult<Option<Snapshot>> {
        let raw = self
            .database
            .run("load_draft", |conn| {
                conn.query_row(
                    "SELECT value FROM active_rounds WHERE key = ?1",
                    params![DRAFT_SLOT_KEY],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|source| SqliteDaoError::Query {
                    op: "load_draft",
                    source,
                })
            })
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(error = %err, "stored draft is unreadable; treating as absent");
                Ok(None)
            }
        }
    }

    async fn delete(&self) -> SqliteResult<()> {
        self.database
            .run("clear_draft", |conn| {
                conn.execute(
                    "DELETE FROM active_rounds WHERE key = ?1",
                    params![DRAFT_SLOT_KEY],
                )
                .map_err(|source| SqliteDaoError::Query {
                    op: "clear_draft",
                    source,
                })?;
                Ok(())
            })
            .await
    }

    async fn read_updated_at(&self) -> SqliteResult<Option<i64>> {
        self.database
            .run("draft_updated_at", |conn| {
                conn.query_row(
                    "SELECT updated_at FROM active_rounds WHERE key = ?1",
                    params![DRAFT_SLOT_KEY],
                    |row| row.get::<_, i64>(0),
                )
                .optional()
                .map_err(|source| SqliteDaoError::Query {
                    op: "draft_updated_at",
                    source,
                })
            })
            .await
    }
}

impl DraftStore for SqliteDraftStore {
    fn save(&self, snapshot: Snapshot) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(snapshot).await.map_err(Into::into) })
    }

    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
        let store = self.clone();
        Box::pin(async move { store.read().await.map_err(Into::into) })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete().await.map_err(Into::into) })
    }

    fn updated_at(&self) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let store = self.clone();
        Box::pin(async move { store.read_updated_at().await.map_err(Into::into) })
    }
}

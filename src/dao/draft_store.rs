use futures::future::BoxFuture;

use crate::dao::{models::Snapshot, storage::StorageResult};

/// Fixed key of the single draft slot.
pub const DRAFT_SLOT_KEY: &str = "last";

/// Durable single-slot store holding at most one active-round snapshot.
///
/// `load` treats an unreadable payload as "no draft" and never fails on it;
/// only backend failures surface as errors.
pub trait DraftStore: Send + Sync {
    /// Upsert the draft slot, stamping a fresh `updatedAt`.
    fn save(&self, snapshot: Snapshot) -> BoxFuture<'static, StorageResult<()>>;
    /// Read the stored draft, if any.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Snapshot>>>;
    /// Delete the draft slot; no-op when already empty.
    fn clear(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Read only the `updated_at` marker of the draft, without decoding it.
    fn updated_at(&self) -> BoxFuture<'static, StorageResult<Option<i64>>>;
}

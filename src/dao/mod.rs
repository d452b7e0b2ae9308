/// Single-slot draft persistence contract.
pub mod draft_store;
/// Database model definitions.
pub mod models;
/// Finalized rounds persistence contract.
pub mod round_ledger;
/// SQLite backend for drafts and the ledger.
#[cfg(feature = "sqlite-store")]
pub mod sqlite;
/// Storage abstraction layer for database operations.
pub mod storage;

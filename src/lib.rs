//! Library crate for fairplay-core: the active-round state manager with
//! debounced draft persistence, and the ledger of finished rounds.

/// Runtime configuration loading.
pub mod config;
/// Persistence contracts, models and backends.
pub mod dao;
/// Request and report types.
pub mod dto;
/// Service-level error type.
pub mod error;
/// Operations composed over the round manager and the stores.
pub mod services;
/// The live round, its autosave pipeline and the round manager.
pub mod state;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::dao::{
    models::{NewRoundEntity, RoundDetailsEntity, RoundSummaryEntity, SavedRound},
    storage::{StorageError, StorageResult},
};

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failures reported by a [`RoundLedger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The payload was rejected before touching storage.
    #[error("invalid round: {0}")]
    Invalid(String),
    /// No finalized round carries this identifier.
    #[error("round `{0}` not found")]
    NotFound(i64),
    /// The backend failed; any partial write was rolled back.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Durable, append-only store of finalized rounds and their hole rows.
pub trait RoundLedger: Send + Sync {
    /// Persist a round and its holes atomically, deriving the stroke total.
    fn append(&self, round: NewRoundEntity) -> BoxFuture<'static, LedgerResult<SavedRound>>;
    /// All rounds, most recent date first, newest insert first on ties.
    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<RoundSummaryEntity>>>;
    /// One round with its hole rows ordered by hole number.
    fn get_details(&self, id: i64) -> BoxFuture<'static, LedgerResult<RoundDetailsEntity>>;
    /// Delete a round together with its hole rows.
    fn remove(&self, id: i64) -> BoxFuture<'static, LedgerResult<()>>;
}

/// Validate an append payload and derive its stroke total; shared by every backend.
pub fn validate_new_round(round: &NewRoundEntity) -> LedgerResult<u32> {
    if round.holes.is_empty() {
        return Err(LedgerError::Invalid("no holes to save".into()));
    }
    total_strokes(round).ok_or_else(|| LedgerError::Invalid("stroke total out of range".into()))
}

/// Sum the strokes of the supplied holes; `None` when the sum overflows.
pub fn total_strokes(round: &NewRoundEntity) -> Option<u32> {
    round
        .holes
        .iter()
        .try_fold(0u32, |total, hole| total.checked_add(hole.strokes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::HoleRecordEntity;

    fn round(strokes: &[u32]) -> NewRoundEntity {
        NewRoundEntity {
            date: "2025-06-01".into(),
            holes_count: 9,
            holes: strokes
                .iter()
                .zip(1..)
                .map(|(&strokes, number)| HoleRecordEntity {
                    number,
                    strokes,
                    ..HoleRecordEntity::default()
                })
                .collect(),
            course: None,
            weather: None,
        }
    }

    #[test]
    fn total_is_derived_from_hole_strokes() {
        assert_eq!(validate_new_round(&round(&[4, 5, 0])).unwrap(), 9);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        assert_eq!(total_strokes(&round(&[u32::MAX, 5])), None);
        assert!(matches!(
            validate_new_round(&round(&[u32::MAX, 5])),
            Err(LedgerError::Invalid(_))
        ));
    }
}

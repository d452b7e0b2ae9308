pub mod autosave;
/// Live round value types and pure transforms.
pub mod round;
pub mod scheduler;
pub mod snapshot;
/// Phases of the round slot and their transitions.
pub mod state_machine;

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{draft_store::DraftStore, models::SavedRound, models::Snapshot, round_ledger::RoundLedger},
    error::ServiceError,
};

pub use self::autosave::{DEFAULT_AUTOSAVE_DELAY, SaveOutcome, SkipReason};
pub use self::round::{ActiveRound, Hole, RoundExtras, RoundMode, Weather};
pub use self::state_machine::{InvalidTransition, RoundEvent, RoundPhase};
use self::{
    autosave::Autosave,
    round::SUPPORTED_HOLE_COUNTS,
    scheduler::Scheduler,
    snapshot::{from_snapshot, to_snapshot, today},
    state_machine::RoundStateMachine,
};

/// Round manager shared between the driver and its background tasks.
pub type SharedRoundManager = Arc<RoundManager>;

/// Host application lifecycle, as reported by the embedding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    /// In the foreground and interactive.
    Active,
    /// Visible but not receiving input (e.g. a system overlay).
    Inactive,
    /// Moved to the background; the process may be torn down.
    Background,
}

/// Owner of the single round in progress.
///
/// Mutators are synchronous: they compute the next round, install it and arm
/// the debounced draft write. Only finalize and the flush hooks await storage.
pub struct RoundManager {
    slot: Mutex<RoundStateMachine>,
    autosave: Autosave,
    ledger: Arc<dyn RoundLedger>,
}

impl RoundManager {
    /// Construct a new [`RoundManager`] wrapped in an [`Arc`] so it can be shared.
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        ledger: Arc<dyn RoundLedger>,
        scheduler: Arc<dyn Scheduler>,
        autosave_delay: Duration,
    ) -> SharedRoundManager {
        Arc::new(Self {
            slot: Mutex::new(RoundStateMachine::new()),
            autosave: Autosave::new(drafts, scheduler, autosave_delay),
            ledger,
        })
    }

    fn slot(&self) -> MutexGuard<'_, RoundStateMachine> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only copy of the live round, if any.
    pub fn current(&self) -> Option<ActiveRound> {
        self.slot().round().cloned()
    }

    /// Current phase of the round slot.
    pub fn phase(&self) -> RoundPhase {
        self.slot().phase()
    }

    /// Snapshot of the live round as it would be written now.
    pub fn debug_snapshot(&self) -> Option<Snapshot> {
        self.slot().round().map(to_snapshot)
    }

    /// Whether draft writes are currently suspended by finalize.
    pub fn autosave_blocked(&self) -> bool {
        self.autosave.is_blocked()
    }

    /// Start a new round, superseding any round or draft in progress.
    pub fn start_round(
        &self,
        holes_count: u32,
        extras: RoundExtras,
    ) -> Result<ActiveRound, ServiceError> {
        if !SUPPORTED_HOLE_COUNTS.contains(&holes_count) {
            return Err(ServiceError::InvalidInput(format!(
                "a round has 9 or 18 holes (got {holes_count})"
            )));
        }

        let round = ActiveRound::new(Uuid::new_v4(), today(), holes_count, extras);
        self.install(RoundEvent::Start, round.clone())?;
        info!(round_id = %round.round_id, holes_count, mode = ?round.mode, "round started");
        Ok(round)
    }

    /// Resume a saved draft, keeping its round id and re-enabling autosave.
    ///
    /// Drafts that do not describe a 9 or 18 hole round are rejected with
    /// [`ServiceError::InvalidInput`] and leave the slot untouched.
    pub fn hydrate_from_snapshot(&self, snapshot: &Snapshot) -> Result<ActiveRound, ServiceError> {
        let round = from_snapshot(snapshot)?;
        self.install(RoundEvent::Hydrate, round.clone())?;
        info!(round_id = %round.round_id, current_index = round.current_index, "round resumed from draft");
        Ok(round)
    }

    fn install(&self, event: RoundEvent, round: ActiveRound) -> Result<(), ServiceError> {
        let mut slot = self.slot();
        if slot.phase() == RoundPhase::Finalizing {
            return Err(ServiceError::InvalidState(
                "a round is being finalized".into(),
            ));
        }
        // A new or resumed round supersedes any pending write of the previous one.
        self.autosave.rearm();
        slot.install(event, round.clone())?;
        self.autosave.schedule(to_snapshot(&round));
        Ok(())
    }

    /// Apply `edit` to the live round. Unchanged rounds do not schedule a write.
    fn update(&self, edit: impl FnOnce(&ActiveRound) -> ActiveRound) -> Option<ActiveRound> {
        let mut slot = self.slot();
        let current = slot.round()?;
        let next = edit(current);
        if &next == current {
            return Some(next);
        }
        if let Err(err) = slot.install(RoundEvent::Mutate, next.clone()) {
            warn!(error = %err, "round update rejected");
            return slot.round().cloned();
        }
        if slot.phase() == RoundPhase::Active {
            self.autosave.schedule(to_snapshot(&next));
        }
        Some(next)
    }

    /// Set strokes on a hole, clamped to `0..=99`.
    pub fn set_stroke_for_hole(&self, hole_number: u32, strokes: i64) -> Option<ActiveRound> {
        self.update(|round| round.with_strokes(hole_number, strokes))
    }

    /// Set putts on a stats hole, clamped to `0..=99`.
    pub fn set_putts_for_hole(&self, hole_number: u32, putts: i64) -> Option<ActiveRound> {
        self.update(|round| round.with_putts(hole_number, putts))
    }

    /// Set penalties on a stats hole, clamped to `0..=99`.
    pub fn set_penalties_for_hole(&self, hole_number: u32, penalties: i64) -> Option<ActiveRound> {
        self.update(|round| round.with_penalties(hole_number, penalties))
    }

    /// Flip fairway hit on a stats hole.
    pub fn toggle_fairway_hit(&self, hole_number: u32) -> Option<ActiveRound> {
        self.update(|round| round.with_fairway_toggled(hole_number))
    }

    /// Flip green in regulation on a stats hole.
    pub fn toggle_green_in_reg(&self, hole_number: u32) -> Option<ActiveRound> {
        self.update(|round| round.with_green_in_reg_toggled(hole_number))
    }

    /// Move to the next hole; no-op on the last one.
    pub fn next_hole(&self) -> Option<ActiveRound> {
        self.update(ActiveRound::next_hole)
    }

    /// Move to the previous hole; no-op on the first one.
    pub fn prev_hole(&self) -> Option<ActiveRound> {
        self.update(ActiveRound::prev_hole)
    }

    /// Write the round to the ledger, clear the draft and empty the slot.
    ///
    /// Returns `Ok(None)` without touching storage when no round is active.
    /// A ledger failure leaves the round active and re-arms autosave. Dropping
    /// the future before the ledger write lands has the same effect.
    pub async fn end_round(&self) -> Result<Option<SavedRound>, ServiceError> {
        let round = {
            let mut slot = self.slot();
            match slot.phase() {
                RoundPhase::Empty => return Ok(None),
                RoundPhase::Finalizing => {
                    return Err(ServiceError::InvalidState(
                        "round is already being finalized".into(),
                    ));
                }
                RoundPhase::Active => slot.begin_finalize()?,
            }
        };
        let mut guard = FinalizeGuard {
            manager: self,
            stage: FinalizeStage::Appending,
        };

        self.autosave.block().await;

        let saved = match self.ledger.append(round.to_new_round()).await {
            Ok(saved) => saved,
            Err(err) => {
                drop(guard);
                warn!(round_id = %round.round_id, error = %err, "finalize failed; round kept active");
                return Err(err.into());
            }
        };
        guard.stage = FinalizeStage::Written;

        // The ledger row is authoritative now; a stale draft is only cosmetic.
        if let Err(err) = self.autosave.clear_draft().await {
            warn!(round_id = %round.round_id, error = %err, "failed to clear draft after finalize");
        }

        guard.stage = FinalizeStage::Done;
        self.slot().commit_finalize()?;
        info!(
            round_id = %round.round_id,
            ledger_id = saved.id,
            total_strokes = saved.total_strokes,
            "round finalized"
        );
        Ok(Some(saved))
    }

    /// Return a finalizing round to play and resume autosave for it.
    fn restore_after_finalize(&self) {
        let restored = match self.slot().abort_finalize() {
            Ok(round) => round,
            Err(err) => {
                warn!(error = %err, "no finalizing round to restore");
                return;
            }
        };
        self.autosave.rearm();
        self.autosave.schedule(to_snapshot(&restored));
    }

    /// Flush the draft immediately when the app leaves the foreground.
    pub async fn on_lifecycle_change(&self, lifecycle: AppLifecycle) -> SaveOutcome {
        match lifecycle {
            AppLifecycle::Active => SaveOutcome::Skipped(SkipReason::NothingToSave),
            AppLifecycle::Inactive | AppLifecycle::Background => self.flush_now().await,
        }
    }

    /// Best-effort flush run when the manager is torn down.
    pub async fn shutdown(&self) -> SaveOutcome {
        self.flush_now().await
    }

    async fn flush_now(&self) -> SaveOutcome {
        let fallback = self.debug_snapshot();
        self.autosave.flush(fallback).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FinalizeStage {
    Appending,
    Written,
    Done,
}

/// Settles the slot when `end_round` stops early, either on a ledger error or
/// because its future was dropped.
struct FinalizeGuard<'a> {
    manager: &'a RoundManager,
    stage: FinalizeStage,
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        match self.stage {
            FinalizeStage::Appending => self.manager.restore_after_finalize(),
            FinalizeStage::Written => {
                if let Err(err) = self.manager.slot().commit_finalize() {
                    warn!(error = %err, "finalized round already released");
                }
            }
            FinalizeStage::Done => {}
        }
    }
}

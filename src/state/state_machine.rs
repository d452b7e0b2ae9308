use thiserror::Error;

use crate::state::round::ActiveRound;

/// Lifecycle phases of the single round slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No round in progress.
    Empty,
    /// A round is being played and mirrored to the draft slot.
    Active,
    /// The round is being written to the ledger; draft writes are suspended.
    Finalizing,
}

/// Events that move the slot between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// A brand-new round replaces whatever was in the slot.
    Start,
    /// A saved draft is resumed.
    Hydrate,
    /// A scoring or navigation change.
    Mutate,
    /// Finalize has begun.
    BeginFinalize,
    /// The ledger accepted the round.
    FinalizeCommitted,
    /// The ledger rejected the round; play continues.
    FinalizeFailed,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the slot was in when the event was received.
    pub from: RoundPhase,
    /// Event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Owner of the live round and its phase.
#[derive(Debug, Clone, Default)]
pub struct RoundStateMachine {
    round: Option<ActiveRound>,
    finalizing: bool,
}

impl RoundStateMachine {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        match (&self.round, self.finalizing) {
            (None, _) => RoundPhase::Empty,
            (Some(_), false) => RoundPhase::Active,
            (Some(_), true) => RoundPhase::Finalizing,
        }
    }

    /// The live round, present while active or finalizing.
    pub fn round(&self) -> Option<&ActiveRound> {
        self.round.as_ref()
    }

    /// Install a round produced by `event`, returning the resulting phase.
    pub fn install(
        &mut self,
        event: RoundEvent,
        round: ActiveRound,
    ) -> Result<RoundPhase, InvalidTransition> {
        let next = compute_transition(self.phase(), event)?;
        if next == RoundPhase::Empty {
            return Err(InvalidTransition {
                from: self.phase(),
                event,
            });
        }
        self.finalizing = next == RoundPhase::Finalizing;
        self.round = Some(round);
        Ok(next)
    }

    /// Enter finalizing, returning the round to persist.
    pub fn begin_finalize(&mut self) -> Result<ActiveRound, InvalidTransition> {
        let next = compute_transition(self.phase(), RoundEvent::BeginFinalize)?;
        self.finalizing = next == RoundPhase::Finalizing;
        self.round.clone().ok_or(InvalidTransition {
            from: RoundPhase::Empty,
            event: RoundEvent::BeginFinalize,
        })
    }

    /// Release the round once the ledger holds it.
    pub fn commit_finalize(&mut self) -> Result<ActiveRound, InvalidTransition> {
        compute_transition(self.phase(), RoundEvent::FinalizeCommitted)?;
        self.finalizing = false;
        self.round.take().ok_or(InvalidTransition {
            from: RoundPhase::Empty,
            event: RoundEvent::FinalizeCommitted,
        })
    }

    /// Return to active play after a failed ledger write.
    pub fn abort_finalize(&mut self) -> Result<ActiveRound, InvalidTransition> {
        compute_transition(self.phase(), RoundEvent::FinalizeFailed)?;
        self.finalizing = false;
        self.round.clone().ok_or(InvalidTransition {
            from: RoundPhase::Empty,
            event: RoundEvent::FinalizeFailed,
        })
    }
}

/// Compute the phase reached by applying `event` in `from`.
fn compute_transition(from: RoundPhase, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
    let next = match (from, event) {
        (RoundPhase::Empty | RoundPhase::Active, RoundEvent::Start) => RoundPhase::Active,
        (RoundPhase::Empty | RoundPhase::Active, RoundEvent::Hydrate) => RoundPhase::Active,
        (RoundPhase::Active, RoundEvent::Mutate) => RoundPhase::Active,
        (RoundPhase::Finalizing, RoundEvent::Mutate) => RoundPhase::Finalizing,
        (RoundPhase::Active, RoundEvent::BeginFinalize) => RoundPhase::Finalizing,
        (RoundPhase::Finalizing, RoundEvent::FinalizeCommitted) => RoundPhase::Empty,
        (RoundPhase::Finalizing, RoundEvent::FinalizeFailed) => RoundPhase::Active,
        (from, event) => return Err(InvalidTransition { from, event }),
    };
    Ok(next)
}

//! Debounced mirroring of the live round into the draft slot.
//!
//! Only the most recent snapshot is ever written. A block flag suspends every
//! write while a round is being finalized, and a write gate serializes draft
//! writes so finalize can wait out one that is already in flight.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::{debug, trace, warn};

use crate::{
    dao::{
        draft_store::DraftStore,
        models::Snapshot,
        storage::{StorageError, StorageResult},
    },
    state::scheduler::{ScheduledTask, Scheduler},
};

/// Default debounce window between the last mutation and the draft write.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(250);

/// Result of a best-effort draft write. Failures are already logged.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The draft slot now holds the latest snapshot.
    Saved,
    /// Nothing was written.
    Skipped(SkipReason),
    /// The store rejected the write.
    Failed(StorageError),
}

impl SaveOutcome {
    /// Whether the draft slot was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// Why a best-effort write did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Finalize is in progress or completed for this round.
    Blocked,
    /// No round state to persist.
    NothingToSave,
}

#[derive(Debug, Default)]
struct PipelineState {
    latest: Option<Snapshot>,
    blocked: bool,
    pending: Option<ScheduledTask>,
}

struct Shared {
    state: Mutex<PipelineState>,
    write_gate: tokio::sync::Mutex<()>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Debounced draft writer owned by the round manager.
pub struct Autosave {
    drafts: Arc<dyn DraftStore>,
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
    shared: Arc<Shared>,
}

impl Autosave {
    /// Writer over `drafts` that waits `delay` after the last change.
    pub fn new(
        drafts: Arc<dyn DraftStore>,
        scheduler: Arc<dyn Scheduler>,
        delay: Duration,
    ) -> Self {
        Self {
            drafts,
            scheduler,
            delay,
            shared: Arc::new(Shared {
                state: Mutex::new(PipelineState::default()),
                write_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Cache `snapshot` and (re)arm the debounce timer. No-op while blocked.
    pub fn schedule(&self, snapshot: Snapshot) {
        let mut state = self.shared.state();
        if state.blocked {
            trace!("autosave blocked; dropping snapshot");
            return;
        }
        state.latest = Some(snapshot);

        let shared = Arc::clone(&self.shared);
        let drafts = Arc::clone(&self.drafts);
        let task = self.scheduler.schedule(
            self.delay,
            Box::pin(async move {
                write_latest(shared, drafts, None, "debounced").await;
            }),
        );
        // Replacing the handle cancels the previous timer.
        state.pending = Some(task);
    }

    /// Write the cached snapshot now, or `fallback` when nothing is cached.
    ///
    /// The armed timer is canceled; it would only repeat this write.
    pub async fn flush(&self, fallback: Option<Snapshot>) -> SaveOutcome {
        self.shared.state().pending = None;
        write_latest(
            Arc::clone(&self.shared),
            Arc::clone(&self.drafts),
            fallback,
            "immediate",
        )
        .await
    }

    /// Allow writes again and forget anything belonging to a superseded round.
    pub fn rearm(&self) {
        let mut state = self.shared.state();
        state.blocked = false;
        state.latest = None;
        state.pending = None;
    }

    /// Suspend writes for finalize and wait for an in-flight write to land.
    ///
    /// The flag is raised before the first await, so no later timer or flush
    /// can reach the store.
    pub async fn block(&self) {
        {
            let mut state = self.shared.state();
            state.blocked = true;
            state.latest = None;
            state.pending = None;
        }
        let _gate = self.shared.write_gate.lock().await;
    }

    /// Whether draft writes are currently suspended.
    pub fn is_blocked(&self) -> bool {
        self.shared.state().blocked
    }

    /// Snapshot waiting for the next debounced write.
    pub fn latest(&self) -> Option<Snapshot> {
        self.shared.state().latest.clone()
    }

    /// Delete the draft slot, serialized with other draft writes.
    pub async fn clear_draft(&self) -> StorageResult<()> {
        let _gate = self.shared.write_gate.lock().await;
        self.drafts.clear().await
    }
}

async fn write_latest(
    shared: Arc<Shared>,
    drafts: Arc<dyn DraftStore>,
    fallback: Option<Snapshot>,
    trigger: &'static str,
) -> SaveOutcome {
    let _gate = shared.write_gate.lock().await;
    let snapshot = {
        let state = shared.state();
        if state.blocked {
            return SaveOutcome::Skipped(SkipReason::Blocked);
        }
        state.latest.clone().or(fallback)
    };
    let Some(snapshot) = snapshot else {
        return SaveOutcome::Skipped(SkipReason::NothingToSave);
    };

    let round_id = snapshot.round_id;
    match drafts.save(snapshot).await {
        Ok(()) => {
            debug!(trigger, round_id = ?round_id, "draft written");
            SaveOutcome::Saved
        }
        Err(err) => {
            warn!(trigger, round_id = ?round_id, error = %err, "draft write failed");
            SaveOutcome::Failed(err)
        }
    }
}

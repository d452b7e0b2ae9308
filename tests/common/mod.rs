#![allow(dead_code)]

use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use fairplay_core::{
    dao::{
        draft_store::DraftStore,
        models::{
            HoleRecordEntity, NewRoundEntity, RoundDetailsEntity, RoundSummaryEntity, SavedRound,
            Snapshot,
        },
        round_ledger::{LedgerError, LedgerResult, RoundLedger, validate_new_round},
        storage::{StorageError, StorageResult},
    },
    state::{
        DEFAULT_AUTOSAVE_DELAY, RoundManager, SharedRoundManager, scheduler::TokioScheduler,
        snapshot::now_millis,
    },
};
use futures::future::BoxFuture;

fn backend_down(op: &str) -> StorageError {
    StorageError::unavailable(format!("{op} failed"), io::Error::other("backend down"))
}

#[derive(Default)]
struct DraftInner {
    slot: Option<Snapshot>,
    saves: Vec<Snapshot>,
    clears: usize,
    fail_saves: bool,
    save_delay: Option<Duration>,
}

/// In-memory draft slot that records every write.
#[derive(Clone, Default)]
pub struct MemoryDraftStore {
    inner: Arc<Mutex<DraftInner>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<Snapshot> {
        self.inner.lock().unwrap().slot.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().unwrap().saves.len()
    }

    pub fn saves(&self) -> Vec<Snapshot> {
        self.inner.lock().unwrap().saves.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.inner.lock().unwrap().clears
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().unwrap().fail_saves = fail;
    }

    /// Make every save sleep before it lands, to observe in-flight writes.
    pub fn slow_saves(&self, delay: Duration) {
        self.inner.lock().unwrap().save_delay = Some(delay);
    }

    /// Put a snapshot in the slot verbatim, keeping its `updated_at`.
    pub fn put(&self, snapshot: Snapshot) {
        self.inner.lock().unwrap().slot = Some(snapshot);
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, mut snapshot: Snapshot) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let delay = inner.lock().unwrap().save_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut inner = inner.lock().unwrap();
            if inner.fail_saves {
                return Err(backend_down("draft save"));
            }
            snapshot.updated_at = now_millis();
            inner.saves.push(snapshot.clone());
            inner.slot = Some(snapshot);
            Ok(())
        })
    }

    fn load(&self) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(inner.lock().unwrap().slot.clone()) })
    }

    fn clear(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut inner = inner.lock().unwrap();
            inner.clears += 1;
            inner.slot = None;
            Ok(())
        })
    }

    fn updated_at(&self) -> BoxFuture<'static, StorageResult<Option<i64>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            Ok(inner
                .lock()
                .unwrap()
                .slot
                .as_ref()
                .map(|snapshot| snapshot.updated_at))
        })
    }
}

#[derive(Default)]
struct LedgerInner {
    rounds: Vec<(SavedRound, NewRoundEntity)>,
    next_id: i64,
    fail_appends: bool,
    append_delay: Option<Duration>,
}

/// In-memory ledger with switchable append failures.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<Mutex<LedgerInner>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rounds(&self) -> Vec<(SavedRound, NewRoundEntity)> {
        self.inner.lock().unwrap().rounds.clone()
    }

    pub fn fail_appends(&self, fail: bool) {
        self.inner.lock().unwrap().fail_appends = fail;
    }

    pub fn slow_appends(&self, delay: Duration) {
        self.inner.lock().unwrap().append_delay = Some(delay);
    }
}

impl RoundLedger for MemoryLedger {
    fn append(&self, round: NewRoundEntity) -> BoxFuture<'static, LedgerResult<SavedRound>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let total_strokes = validate_new_round(&round)?;
            let delay = inner.lock().unwrap().append_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut inner = inner.lock().unwrap();
            if inner.fail_appends {
                return Err(backend_down("ledger append").into());
            }
            inner.next_id += 1;
            let saved = SavedRound {
                id: inner.next_id,
                total_strokes,
            };
            inner.rounds.push((saved, round));
            Ok(saved)
        })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<RoundSummaryEntity>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut rounds: Vec<RoundSummaryEntity> = inner
                .lock()
                .unwrap()
                .rounds
                .iter()
                .map(|(saved, round)| RoundSummaryEntity {
                    id: saved.id,
                    date: round.date.clone(),
                    holes_count: round.holes_count,
                    total_strokes: saved.total_strokes,
                    course: round.course.clone(),
                })
                .collect();
            rounds.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
            Ok(rounds)
        })
    }

    fn get_details(&self, id: i64) -> BoxFuture<'static, LedgerResult<RoundDetailsEntity>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let inner = inner.lock().unwrap();
            let (saved, round) = inner
                .rounds
                .iter()
                .find(|(saved, _)| saved.id == id)
                .ok_or(LedgerError::NotFound(id))?;
            let mut holes: Vec<HoleRecordEntity> = round.holes.clone();
            holes.sort_by_key(|hole| hole.number);
            Ok(RoundDetailsEntity {
                id: saved.id,
                date: round.date.clone(),
                holes_count: round.holes_count,
                total_strokes: saved.total_strokes,
                course: round.course.clone(),
                weather: round.weather.clone().unwrap_or_default(),
                holes,
            })
        })
    }

    fn remove(&self, id: i64) -> BoxFuture<'static, LedgerResult<()>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut inner = inner.lock().unwrap();
            let before = inner.rounds.len();
            inner.rounds.retain(|(saved, _)| saved.id != id);
            if inner.rounds.len() == before {
                return Err(LedgerError::NotFound(id));
            }
            Ok(())
        })
    }
}

/// A round manager wired to in-memory stores on the current runtime.
pub struct Harness {
    pub manager: SharedRoundManager,
    pub drafts: MemoryDraftStore,
    pub ledger: MemoryLedger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_drafts(MemoryDraftStore::new())
    }

    /// Build a manager over an existing draft slot, as after an app restart.
    pub fn with_drafts(drafts: MemoryDraftStore) -> Self {
        let ledger = MemoryLedger::new();
        let manager = RoundManager::new(
            Arc::new(drafts.clone()),
            Arc::new(ledger.clone()),
            Arc::new(TokioScheduler::current().expect("inside a tokio runtime")),
            DEFAULT_AUTOSAVE_DELAY,
        );
        Self {
            manager,
            drafts,
            ledger,
        }
    }
}

/// Sleep on the (usually paused) tokio clock.
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

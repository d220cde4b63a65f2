//! MutationReconciler - persists drag results and undoes rejected ones.
//!
//! By the time a change reaches the reconciler the store already shows it.
//! The reconciler sends the single backend update and then either leaves the
//! store alone (accepted) or rolls it back (rejected, timed out, unreachable).
//!
//! # Ordering
//!
//! Responses can arrive out of order with respect to drags. Every commit gets
//! a sequence number from a monotonic counter, and the latest number per item
//! is recorded when the commit is prepared. A failure is only acted on if its
//! commit is still the latest for that item; otherwise a newer commit owns the
//! item and the stale failure is dropped without publishing an event.
//!
//! While an item has unresolved commits the ledger also remembers the last
//! status the backend accepted for it. A rejected commit whose older siblings
//! are still in flight is rolled back to that status rather than to its own
//! `from`, which only ever existed on the board. If an older commit is
//! accepted after every newer one failed, the board is moved to the accepted
//! status.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taskboard_models::{ProjectId, TaskId, TaskStatus, WorkItem};
use taskboard_persistence::{PersistenceError, TaskBackend};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{ReconcilerConfig, RollbackStrategy};
use crate::error::BoardError;
use crate::event::{CommitEvent, CommitOutcome, StatusChange};
use crate::store::BoardStore;

/// A prepared, not yet executed commit.
#[derive(Debug)]
pub struct CommitTicket {
    change: StatusChange,
    seq: u64,
}

impl CommitTicket {
    /// The change being committed.
    pub fn change(&self) -> &StatusChange {
        &self.change
    }

    /// Sequence number assigned at preparation.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Bookkeeping for one item while any of its commits is unresolved.
struct Chain {
    /// Highest sequence number issued for the item.
    latest: u64,
    /// Status the latest commit moves the item to.
    latest_status: TaskStatus,
    /// Last status the backend is known to hold.
    confirmed: TaskStatus,
    confirmed_seq: u64,
    unresolved: BTreeSet<u64>,
}

#[derive(Default)]
struct Ledger {
    next_seq: u64,
    chains: HashMap<TaskId, Chain>,
}

impl Ledger {
    fn register(&mut self, change: &StatusChange) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;

        // A new chain starts from the status the board showed before the
        // drag, which no unresolved commit has touched.
        let chain = self
            .chains
            .entry(change.task_id.clone())
            .or_insert_with(|| Chain {
                latest: seq,
                latest_status: change.to,
                confirmed: change.from,
                confirmed_seq: 0,
                unresolved: BTreeSet::new(),
            });
        chain.latest = seq;
        chain.latest_status = change.to;
        chain.unresolved.insert(seq);
        seq
    }

    fn is_stale(&self, id: &TaskId, seq: u64) -> bool {
        self.chains.get(id).is_some_and(|chain| chain.latest > seq)
    }

    fn confirmed(&self, id: &TaskId) -> Option<TaskStatus> {
        self.chains.get(id).map(|chain| chain.confirmed)
    }

    /// Records an accepted commit.
    ///
    /// Returns true when every newer commit for the item has already failed,
    /// so the board currently shows an older status than the backend holds.
    fn confirm(&mut self, id: &TaskId, seq: u64, status: TaskStatus) -> bool {
        let Some(chain) = self.chains.get_mut(id) else {
            return false;
        };
        if seq <= chain.confirmed_seq {
            return false;
        }
        chain.confirmed = status;
        chain.confirmed_seq = seq;

        seq < chain.latest && chain.unresolved.range(seq + 1..).next().is_none()
    }

    fn resolve(&mut self, id: &TaskId, seq: u64) {
        let drained = match self.chains.get_mut(id) {
            Some(chain) => {
                chain.unresolved.remove(&seq);
                chain.unresolved.is_empty()
            }
            None => false,
        };
        if drained {
            self.chains.remove(id);
        }
    }

    /// Speculative status of every item whose latest commit is unresolved.
    fn pending(&self) -> HashMap<TaskId, TaskStatus> {
        self.chains
            .iter()
            .filter(|(_, chain)| chain.unresolved.contains(&chain.latest))
            .map(|(id, chain)| (id.clone(), chain.latest_status))
            .collect()
    }

    fn unresolved(&self) -> usize {
        self.chains.values().map(|chain| chain.unresolved.len()).sum()
    }
}

/// Reconciles speculative status changes with the backend.
pub struct MutationReconciler {
    store: BoardStore,
    backend: Arc<dyn TaskBackend>,
    project_id: ProjectId,
    config: ReconcilerConfig,
    ledger: Mutex<Ledger>,
    events: broadcast::Sender<CommitEvent>,
}

impl MutationReconciler {
    /// Creates a reconciler writing to `backend` and rolling back `store`.
    pub fn new(
        store: BoardStore,
        backend: Arc<dyn TaskBackend>,
        project_id: ProjectId,
        config: ReconcilerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            store,
            backend,
            project_id,
            config,
            ledger: Mutex::new(Ledger::default()),
            events,
        }
    }

    /// Subscribes to commit results.
    pub fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.events.subscribe()
    }

    /// Number of commits awaiting a backend answer.
    pub fn in_flight(&self) -> usize {
        self.ledger().unresolved()
    }

    /// Speculative statuses a canonical load must not overwrite yet.
    pub(crate) fn pending_statuses(&self) -> HashMap<TaskId, TaskStatus> {
        self.ledger().pending()
    }

    /// Fetches the project's tasks, bounded by the request timeout.
    ///
    /// Also returns the statuses to force onto the fetched rows: those of
    /// unresolved commits, plus the current board status of items whose
    /// commits resolved while the fetch was outstanding, since the fetched
    /// rows may predate that resolution.
    pub(crate) async fn fetch_canonical(
        &self,
    ) -> taskboard_persistence::Result<(Vec<WorkItem>, HashMap<TaskId, TaskStatus>)> {
        let before = self.pending_statuses();
        let items = self
            .bounded(self.backend.list_tasks(&self.project_id))
            .await?;

        let mut overrides = self.pending_statuses();
        for id in before.into_keys() {
            if overrides.contains_key(&id) {
                continue;
            }
            if let Some(status) = self.store.status_of(&id) {
                overrides.insert(id, status);
            }
        }
        Ok((items, overrides))
    }

    /// Registers a change and assigns its sequence number.
    ///
    /// Returns `None` for a no-op change; nothing needs persisting then.
    /// Must be called synchronously when the drag ends so that a later drag
    /// of the same item always gets a higher number.
    pub fn prepare(&self, change: StatusChange) -> Option<CommitTicket> {
        if change.is_noop() {
            debug!(task_id = %change.task_id, status = %change.to, "drop on original column, nothing to commit");
            return None;
        }

        let seq = self.ledger().register(&change);

        debug!(task_id = %change.task_id, from = %change.from, to = %change.to, seq, "commit prepared");
        Some(CommitTicket { change, seq })
    }

    /// Sends a prepared change to the backend and reconciles the result.
    pub async fn execute(&self, ticket: CommitTicket) -> CommitOutcome {
        let CommitTicket { change, seq } = ticket;

        let result = self
            .bounded(self.backend.update_task_status(&change.task_id, change.to))
            .await;

        let outcome = match result {
            Ok(()) => {
                info!(task_id = %change.task_id, status = %change.to, seq, "status change committed");
                if self.ledger().confirm(&change.task_id, seq, change.to) {
                    debug!(task_id = %change.task_id, seq, "newer moves were rolled back, showing accepted status");
                    self.place(&change.task_id, change.to);
                }
                CommitOutcome::Committed
            }
            Err(e) => {
                warn!(task_id = %change.task_id, status = %change.to, seq, error = %e, "status change rejected");
                if self.ledger().is_stale(&change.task_id, seq) {
                    debug!(task_id = %change.task_id, seq, "newer commit owns item, dropping stale failure");
                    CommitOutcome::Superseded
                } else {
                    self.roll_back(&change, seq, &e).await
                }
            }
        };

        self.finish(&change.task_id, seq);

        // A superseded failure changed nothing the user can see.
        if outcome != CommitOutcome::Superseded {
            // No subscribers is fine.
            let _ = self.events.send(CommitEvent {
                change,
                outcome: outcome.clone(),
            });
        }

        outcome
    }

    /// Prepares and executes a change in one call.
    pub async fn commit(&self, change: StatusChange) -> CommitOutcome {
        match self.prepare(change) {
            Some(ticket) => self.execute(ticket).await,
            None => CommitOutcome::Unchanged,
        }
    }

    async fn roll_back(&self, change: &StatusChange, seq: u64, cause: &PersistenceError) -> CommitOutcome {
        let reason = cause.to_string();

        match self.config.rollback {
            RollbackStrategy::PointRestore => self.restore_point(change),
            RollbackStrategy::Reload => {
                match self.fetch_canonical().await {
                    Ok((items, mut overrides)) => {
                        // The fetch was a suspension point; a newer drag may have started.
                        if self.ledger().is_stale(&change.task_id, seq) {
                            debug!(task_id = %change.task_id, seq, "newer commit started during reload, discarding it");
                            return CommitOutcome::Superseded;
                        }
                        overrides.remove(&change.task_id);
                        info!(count = items.len(), pending = overrides.len(), "board reloaded after rejected change");
                        if let Err(e) = self.store.replace(items, &overrides) {
                            warn!(error = %e, "failed to load canonical tasks");
                        }
                    }
                    Err(e) => {
                        warn!(task_id = %change.task_id, error = %e, "reload failed, restoring item only");
                        self.restore_point(change);
                    }
                }
            }
        }

        CommitOutcome::Failed(reason)
    }

    /// Puts a rejected item back on the last status the backend accepted.
    ///
    /// That is the `from` of the change unless older commits for the item
    /// are still unresolved, in which case `from` was never confirmed.
    fn restore_point(&self, change: &StatusChange) {
        let status = self
            .ledger()
            .confirmed(&change.task_id)
            .unwrap_or(change.from);
        self.place(&change.task_id, status);
    }

    fn place(&self, id: &TaskId, status: TaskStatus) {
        match self.store.set_status(id, status) {
            Ok(_) => {
                info!(task_id = %id, %status, "item placed after backend answer");
            }
            Err(BoardError::ItemNotFound(_)) => {
                debug!(task_id = %id, "item already gone");
            }
            Err(e) => warn!(task_id = %id, error = %e, "failed to place item"),
        }
    }

    fn finish(&self, id: &TaskId, seq: u64) {
        self.ledger().resolve(id, seq);
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = taskboard_persistence::Result<T>>,
    ) -> taskboard_persistence::Result<T> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(PersistenceError::Timeout(limit)))
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // Plain counters only, safe to keep using after a poisoning panic.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps commit results in arrival order for callers that poll instead of
/// subscribing.
#[derive(Debug)]
pub struct CommitLog {
    events: VecDeque<CommitEvent>,
    capacity: usize,
}

impl CommitLog {
    /// Creates a log holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Records an event, evicting the oldest when full.
    pub fn push(&mut self, event: CommitEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Drains every received event from `rx` into the log.
    pub fn drain(&mut self, rx: &mut broadcast::Receiver<CommitEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => self.push(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "commit log lagged behind");
                }
                Err(_) => break,
            }
        }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &CommitEvent> {
        self.events.iter()
    }

    /// Most recent failure, for an error banner.
    pub fn last_failure(&self) -> Option<&CommitEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| matches!(e.outcome, CommitOutcome::Failed(_)))
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use taskboard_models::ColumnSet;
    use tokio::sync::Notify;

    use crate::drag::DragController;

    /// Backend double with scripted update results.
    #[derive(Default)]
    struct ScriptedBackend {
        update_results: Mutex<VecDeque<taskboard_persistence::Result<()>>>,
        update_delay: Option<Duration>,
        canonical: Mutex<Vec<WorkItem>>,
        list_fails: bool,
        list_gate: Option<Arc<Notify>>,
        update_calls: Mutex<Vec<(TaskId, TaskStatus)>>,
        list_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn with_canonical(items: Vec<WorkItem>) -> Self {
            Self {
                canonical: Mutex::new(items),
                ..Self::default()
            }
        }

        fn push_result(&self, result: taskboard_persistence::Result<()>) {
            self.update_results.lock().unwrap().push_back(result);
        }

        fn update_calls(&self) -> Vec<(TaskId, TaskStatus)> {
            self.update_calls.lock().unwrap().clone()
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskBackend for ScriptedBackend {
        async fn update_task_status(
            &self,
            id: &TaskId,
            status: TaskStatus,
        ) -> taskboard_persistence::Result<()> {
            self.update_calls.lock().unwrap().push((id.clone(), status));
            if let Some(delay) = self.update_delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.update_results.lock().unwrap().pop_front();
            next.unwrap_or(Ok(()))
        }

        async fn list_tasks(&self, _project_id: &ProjectId) -> taskboard_persistence::Result<Vec<WorkItem>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.list_gate {
                gate.notified().await;
            }
            if self.list_fails {
                return Err(PersistenceError::Rejected("list unavailable".into()));
            }
            Ok(self.canonical.lock().unwrap().clone())
        }
    }

    fn make_item(id: &str, status: TaskStatus) -> WorkItem {
        WorkItem::new("proj-1", format!("Task {}", id))
            .with_id(id)
            .with_status(status)
    }

    fn initial_items() -> Vec<WorkItem> {
        vec![make_item("t1", TaskStatus::Todo), make_item("t2", TaskStatus::Done)]
    }

    fn rejected() -> taskboard_persistence::Result<()> {
        Err(PersistenceError::Status {
            status: 500,
            body: "boom".into(),
        })
    }

    fn setup(
        backend: ScriptedBackend,
        config: ReconcilerConfig,
    ) -> (BoardStore, Arc<ScriptedBackend>, Arc<MutationReconciler>) {
        let store = BoardStore::new(ColumnSet::default());
        store.load(initial_items()).unwrap();
        let backend = Arc::new(backend);
        let reconciler = Arc::new(MutationReconciler::new(
            store.clone(),
            backend.clone(),
            ProjectId::from("proj-1"),
            config,
        ));
        (store, backend, reconciler)
    }

    fn drag(store: &BoardStore, id: &str, target: &str) -> StatusChange {
        let mut controller = DragController::new(store.clone());
        assert!(controller.begin(&TaskId::from(id)));
        controller.hover(target);
        controller.end(Some(target)).unwrap()
    }

    fn t(id: &str) -> TaskId {
        TaskId::from(id)
    }

    #[tokio::test]
    async fn test_noop_commit_makes_no_call() {
        let (store, backend, reconciler) =
            setup(ScriptedBackend::default(), ReconcilerConfig::default());
        let before = store.snapshot();

        let change = drag(&store, "t1", "todo");
        let outcome = reconciler.commit(change).await;

        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert!(backend.update_calls().is_empty());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_success_keeps_speculative_state() {
        let (store, backend, reconciler) =
            setup(ScriptedBackend::default(), ReconcilerConfig::default());

        let change = drag(&store, "t1", "in_progress");
        let after_drag = store.snapshot();
        let outcome = reconciler.commit(change).await;

        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(backend.update_calls(), vec![(t("t1"), TaskStatus::InProgress)]);
        assert_eq!(backend.list_calls(), 0);
        assert_eq!(store.snapshot(), after_drag);
        assert_eq!(reconciler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failure_reloads_canonical_state() {
        // Backend never applied the move, and someone else renamed t2.
        let mut canonical = initial_items();
        canonical[1].title = "Renamed remotely".into();
        let backend = ScriptedBackend::with_canonical(canonical.clone());
        backend.push_result(rejected());
        let (store, backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let change = drag(&store, "t1", "in_progress");
        let outcome = reconciler.commit(change).await;

        assert!(matches!(outcome, CommitOutcome::Failed(ref reason) if reason.contains("500")));
        assert_eq!(backend.list_calls(), 1);
        assert_eq!(store.items(), canonical);
    }

    #[tokio::test]
    async fn test_point_restore_rollback() {
        let backend = ScriptedBackend::default();
        backend.push_result(rejected());
        let (store, backend, reconciler) = setup(
            backend,
            ReconcilerConfig::new().with_rollback(RollbackStrategy::PointRestore),
        );
        let before = store.snapshot();

        let change = drag(&store, "t1", "review");
        let outcome = reconciler.commit(change).await;

        assert!(matches!(outcome, CommitOutcome::Failed(_)));
        assert_eq!(backend.list_calls(), 0);
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_reload_failure_falls_back_to_point_restore() {
        let backend = ScriptedBackend {
            list_fails: true,
            ..ScriptedBackend::default()
        };
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let change = drag(&store, "t1", "done");
        let outcome = reconciler.commit(change).await;

        assert!(matches!(outcome, CommitOutcome::Failed(_)));
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let backend = ScriptedBackend {
            update_delay: Some(Duration::from_secs(5)),
            canonical: Mutex::new(initial_items()),
            ..ScriptedBackend::default()
        };
        let (store, _backend, reconciler) = setup(
            backend,
            ReconcilerConfig::new().with_request_timeout(Duration::from_millis(200)),
        );

        let change = drag(&store, "t1", "review");
        let outcome = reconciler.commit(change).await;

        assert_eq!(
            outcome,
            CommitOutcome::Failed(PersistenceError::Timeout(Duration::from_millis(200)).to_string())
        );
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));
    }

    #[tokio::test]
    async fn test_stale_failure_is_suppressed() {
        let backend = ScriptedBackend::with_canonical(initial_items());
        backend.push_result(rejected());
        backend.push_result(Ok(()));
        let (store, backend, reconciler) = setup(backend, ReconcilerConfig::default());

        // Commit 1: todo -> in_progress, in flight.
        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        // Commit 2: in_progress -> review, started before commit 1 resolves.
        let second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();
        assert!(second.seq() > first.seq());

        // Commit 1 fails late.
        assert_eq!(reconciler.execute(first).await, CommitOutcome::Superseded);
        assert_eq!(backend.list_calls(), 0);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Review));

        assert_eq!(reconciler.execute(second).await, CommitOutcome::Committed);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Review));
        assert_eq!(reconciler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_stale_failure_after_newer_commit_resolved() {
        let backend = ScriptedBackend::with_canonical(initial_items());
        backend.push_result(Ok(()));
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let second = reconciler.prepare(drag(&store, "t1", "done")).unwrap();

        // Responses arrive out of order: the newer one first.
        assert_eq!(reconciler.execute(second).await, CommitOutcome::Committed);
        assert_eq!(reconciler.execute(first).await, CommitOutcome::Superseded);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Done));
    }

    #[tokio::test]
    async fn test_newer_commit_during_reload_wins() {
        let gate = Arc::new(Notify::new());
        let backend = ScriptedBackend {
            canonical: Mutex::new(initial_items()),
            list_gate: Some(gate.clone()),
            ..ScriptedBackend::default()
        };
        backend.push_result(rejected());
        let (store, backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let handle = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.execute(first).await })
        };

        while backend.list_calls() == 0 {
            tokio::task::yield_now().await;
        }

        // The user drags again while the reload is outstanding.
        let _second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();
        gate.notify_one();

        assert_eq!(handle.await.unwrap(), CommitOutcome::Superseded);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Review));
    }

    #[tokio::test]
    async fn test_reload_keeps_other_items_in_flight() {
        let backend = ScriptedBackend::with_canonical(initial_items());
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let other = reconciler.prepare(drag(&store, "t2", "review")).unwrap();
        let failing = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        assert_eq!(other.change().task_id, t("t2"));

        // The rejected update is the first one executed.
        assert!(matches!(
            reconciler.execute(failing).await,
            CommitOutcome::Failed(_)
        ));

        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));
        assert_eq!(store.status_of(&t("t2")), Some(TaskStatus::Review));
        assert_eq!(reconciler.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_commit_events_published() {
        let backend = ScriptedBackend::with_canonical(initial_items());
        backend.push_result(Ok(()));
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());
        let mut rx = reconciler.subscribe();

        reconciler.commit(drag(&store, "t1", "review")).await;
        reconciler.commit(drag(&store, "t2", "todo")).await;
        // The reload put t2 back in done; dropping it there changes nothing.
        reconciler.commit(drag(&store, "t2", "done")).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.change.task_id, t("t1"));
        assert_eq!(first.outcome, CommitOutcome::Committed);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.change.task_id, t("t2"));
        assert!(matches!(second.outcome, CommitOutcome::Failed(_)));

        // No-op drops publish nothing.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_superseded_failure_is_not_published() {
        let backend = ScriptedBackend::with_canonical(initial_items());
        backend.push_result(rejected());
        backend.push_result(Ok(()));
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());
        let mut rx = reconciler.subscribe();

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();

        assert_eq!(reconciler.execute(first).await, CommitOutcome::Superseded);
        assert_eq!(reconciler.execute(second).await, CommitOutcome::Committed);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.change.to, TaskStatus::Review);
        assert_eq!(event.outcome, CommitOutcome::Committed);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chained_failures_restore_confirmed_status() {
        let backend = ScriptedBackend::default();
        backend.push_result(rejected());
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(
            backend,
            ReconcilerConfig::new().with_rollback(RollbackStrategy::PointRestore),
        );

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();
        assert_eq!(second.change().from, TaskStatus::InProgress);

        // The newer change fails first; in_progress was never accepted.
        assert!(matches!(reconciler.execute(second).await, CommitOutcome::Failed(_)));
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));

        assert_eq!(reconciler.execute(first).await, CommitOutcome::Superseded);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));
        assert_eq!(reconciler.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_reload_fallback_restores_confirmed_status() {
        let backend = ScriptedBackend {
            list_fails: true,
            ..ScriptedBackend::default()
        };
        backend.push_result(rejected());
        backend.push_result(rejected());
        let (store, _backend, reconciler) = setup(backend, ReconcilerConfig::default());

        let first = reconciler.prepare(drag(&store, "t2", "review")).unwrap();
        let second = reconciler.prepare(drag(&store, "t2", "todo")).unwrap();

        assert!(matches!(reconciler.execute(second).await, CommitOutcome::Failed(_)));
        assert_eq!(reconciler.execute(first).await, CommitOutcome::Superseded);
        assert_eq!(store.status_of(&t("t2")), Some(TaskStatus::Done));
    }

    #[tokio::test]
    async fn test_older_success_after_newer_failure_is_shown() {
        let backend = ScriptedBackend::default();
        backend.push_result(rejected());
        backend.push_result(Ok(()));
        let (store, _backend, reconciler) = setup(
            backend,
            ReconcilerConfig::new().with_rollback(RollbackStrategy::PointRestore),
        );

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();

        assert!(matches!(reconciler.execute(second).await, CommitOutcome::Failed(_)));
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::Todo));

        // The backend accepted the older move after all.
        assert_eq!(reconciler.execute(first).await, CommitOutcome::Committed);
        assert_eq!(store.status_of(&t("t1")), Some(TaskStatus::InProgress));
    }

    #[tokio::test]
    async fn test_pending_statuses_track_latest_commit() {
        let (store, _backend, reconciler) =
            setup(ScriptedBackend::default(), ReconcilerConfig::default());

        let first = reconciler.prepare(drag(&store, "t1", "in_progress")).unwrap();
        let second = reconciler.prepare(drag(&store, "t1", "review")).unwrap();
        assert_eq!(
            reconciler.pending_statuses().get(&t("t1")),
            Some(&TaskStatus::Review)
        );

        reconciler.execute(second).await;
        // Only the older commit is left, and it no longer owns the item.
        assert!(reconciler.pending_statuses().is_empty());
        assert_eq!(reconciler.in_flight(), 1);

        reconciler.execute(first).await;
        assert_eq!(reconciler.in_flight(), 0);
    }

    #[test]
    fn test_commit_log() {
        let mut log = CommitLog::new(2);
        let event = |id: &str, outcome| CommitEvent {
            change: StatusChange::new(id, TaskStatus::Todo, TaskStatus::Done),
            outcome,
        };

        log.push(event("t1", CommitOutcome::Failed("x".into())));
        log.push(event("t2", CommitOutcome::Committed));
        assert_eq!(log.last_failure().unwrap().change.task_id, t("t1"));

        log.push(event("t3", CommitOutcome::Committed));
        assert_eq!(log.len(), 2);
        assert!(log.last_failure().is_none());
    }

    #[tokio::test]
    async fn test_commit_log_drain() {
        let (store, _backend, reconciler) =
            setup(ScriptedBackend::default(), ReconcilerConfig::default());
        let mut rx = reconciler.subscribe();
        let mut log = CommitLog::new(8);

        reconciler.commit(drag(&store, "t1", "done")).await;
        reconciler.commit(drag(&store, "t2", "review")).await;
        log.drain(&mut rx);

        let ids: Vec<&str> = log.events().map(|e| e.change.task_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }
}

//! Export session and its run loop
//!
//! A [`Session`] owns one [`Descriptor`] and drives the sequential
//! fetch → process → deliver pipeline over its batch queue:
//!
//! 1. Stop if a pause was requested (checked only between batches)
//! 2. Bring the first eligible batch to the head of the queue
//! 3. Publish a progress snapshot
//! 4. Fetch the batch's records from the [`DataSource`]
//! 5. Hand them to the [`Processor`]
//! 6. Deliver the output to the [`ResultHandler`]
//! 7. Complete or requeue the batch, then checkpoint the descriptor
//!
//! Per-batch failures never end the run: a failed batch consumes one retry
//! and moves to the tail, and is dropped once its budget is spent.

use crate::adapters::processor::{Delivery, Processor, ResultHandler};
use crate::adapters::source::DataSource;
use crate::core::descriptor::{Batch, Descriptor, FailureOutcome};
use crate::core::session::state::{ExportCounters, ProgressSnapshot, SessionState};
use crate::core::state::StateManager;
use crate::domain::ids::{Category, SessionId};
use crate::domain::{BackfillError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Retry budget given to every new batch unless configured otherwise
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Start of history used when a data source cannot report its earliest record
pub fn default_fallback_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 9, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Parameters applied when a session builds or extends its descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Attempts per batch before it is dropped
    pub retry_budget: u32,
    /// Partitioning start for categories without a known earliest record
    pub fallback_epoch: DateTime<Utc>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            fallback_epoch: default_fallback_epoch(),
        }
    }
}

/// Why a batch attempt failed
#[derive(Debug)]
enum BatchFailure {
    /// The data source could not return the records
    Query(BackfillError),
    /// The processor failed on the records
    Process(BackfillError),
    /// The result handler asked for a retry
    Rejected,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchFailure::Query(e) => write!(f, "query failure: {e}"),
            BatchFailure::Process(e) => write!(f, "process failure: {e}"),
            BatchFailure::Rejected => f.write_str("rejected by result handler"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct RunSlot {
    handle: Option<JoinHandle<()>>,
    token: CancellationToken,
}

/// Runtime driver of one descriptor's export
///
/// Created through [`SessionRegistry`](crate::core::session::SessionRegistry),
/// which guarantees one live session per id.
pub struct Session<P: Processor> {
    inner: Arc<Inner<P>>,
    run: Mutex<RunSlot>,
}

struct Inner<P: Processor> {
    id: SessionId,
    descriptor: Mutex<Descriptor>,
    state_tx: watch::Sender<SessionState>,
    progress_tx: watch::Sender<Option<ProgressSnapshot>>,
    counters: Mutex<ExportCounters>,
    generation: AtomicU64,
    source: Arc<dyn DataSource + Send + Sync>,
    processor: P,
    handler: Arc<dyn ResultHandler<P::Output>>,
    state_manager: StateManager,
    settings: SessionSettings,
}

impl<P: Processor> Session<P> {
    /// Load the persisted descriptor for `id`, or build one, and wrap it in
    /// an idle session
    ///
    /// A loaded descriptor has its skip flags cleared (retry counters are
    /// kept) and gains any requested category it does not yet represent.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored descriptor exists but cannot be read.
    pub(crate) async fn open(
        id: SessionId,
        categories: &[Category],
        processor: P,
        handler: Arc<dyn ResultHandler<P::Output>>,
        source: Arc<dyn DataSource + Send + Sync>,
        state_manager: StateManager,
        settings: SessionSettings,
    ) -> Result<Self> {
        let mut counters = ExportCounters::default();

        let descriptor = match state_manager.load_descriptor(&id).await? {
            Some(mut descriptor) => {
                let mut changed = descriptor.clear_skip_flags();
                for batch in descriptor.purge_exhausted() {
                    crate::log_batch_dropped!(&id, &batch, "retry budget already spent");
                    counters.dropped += 1;
                    changed = true;
                }
                changed |= add_categories(&mut descriptor, categories, source.as_ref(), &settings).await;

                tracing::info!(
                    session_id = %id,
                    pending = descriptor.pending_len(),
                    completed_categories = descriptor.completed_categories().len(),
                    export_end = %descriptor.export_end,
                    "Resuming persisted session"
                );

                if changed && !checkpoint(&state_manager, &descriptor).await {
                    counters.persistence_failures += 1;
                }
                descriptor
            }
            None => {
                let mut descriptor = Descriptor::new(id.clone(), Utc::now());
                add_categories(&mut descriptor, categories, source.as_ref(), &settings).await;

                tracing::info!(
                    session_id = %id,
                    pending = descriptor.pending_len(),
                    categories = categories.len(),
                    export_end = %descriptor.export_end,
                    "Created new session"
                );

                if !checkpoint(&state_manager, &descriptor).await {
                    counters.persistence_failures += 1;
                }
                descriptor
            }
        };

        let (state_tx, _) = watch::channel(SessionState::Scheduled);
        let (progress_tx, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(Inner {
                id,
                descriptor: Mutex::new(descriptor),
                state_tx,
                progress_tx,
                counters: Mutex::new(counters),
                generation: AtomicU64::new(0),
                source,
                processor,
                handler,
                state_manager,
                settings,
            }),
            run: Mutex::new(RunSlot {
                handle: None,
                token: CancellationToken::new(),
            }),
        })
    }

    /// Session id
    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    /// Name of the bound processor
    pub fn processor_name(&self) -> &'static str {
        self.inner.processor.name()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.inner.state_tx.borrow()
    }

    /// Progress of the batch in flight; `None` unless running
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.inner.progress_tx.borrow().clone()
    }

    /// Running totals since this session object was created
    pub fn counters(&self) -> ExportCounters {
        *lock(&self.inner.counters)
    }

    /// Copy of the current descriptor
    pub fn descriptor(&self) -> Descriptor {
        lock(&self.inner.descriptor).clone()
    }

    /// Copy of the pending batch queue, head first
    pub fn pending_batches(&self) -> Vec<Batch> {
        lock(&self.inner.descriptor)
            .pending_batches()
            .iter()
            .cloned()
            .collect()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Watch progress snapshots
    pub fn subscribe_progress(&self) -> watch::Receiver<Option<ProgressSnapshot>> {
        self.inner.progress_tx.subscribe()
    }

    /// Start (or restart) the run loop
    ///
    /// A no-op while a run is active and no pause has been requested. After a
    /// pause request the new run waits for the previous one to reach its
    /// batch boundary, so at most one loop ever touches the queue.
    pub fn start(&self) {
        let mut slot = lock(&self.run);

        if let Some(handle) = &slot.handle {
            if !handle.is_finished() && !slot.token.is_cancelled() {
                tracing::debug!(session_id = %self.inner.id, "Run already active, start ignored");
                return;
            }
        }

        let token = CancellationToken::new();
        slot.token = token.clone();
        let previous = slot.handle.take();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state_tx.send_replace(SessionState::Running);

        let inner = Arc::clone(&self.inner);
        slot.handle = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    tracing::warn!(session_id = %inner.id, error = %e, "Previous run ended abnormally");
                }
            }
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.state_tx.send_replace(SessionState::Running);
            }
            inner.run(token, generation).await;
        }));
    }

    /// Request a cooperative pause
    ///
    /// Only effective while running. The loop finishes the batch in flight,
    /// checkpoints, and then moves to [`SessionState::Paused`].
    pub fn pause(&self) {
        if !self.state().is_running() {
            tracing::debug!(session_id = %self.inner.id, state = %self.state(), "Pause ignored");
            return;
        }
        lock(&self.run).token.cancel();
        tracing::info!(session_id = %self.inner.id, "Pause requested, stopping after the current batch");
    }

    /// Wait until the session is no longer running
    pub async fn wait_until_idle(&self) {
        let mut rx = self.inner.state_tx.subscribe();
        let _ = rx.wait_for(|state| !state.is_running()).await;
    }

    /// Rebuild the descriptor from scratch with a fresh export end
    ///
    /// Every category the descriptor knows (pending or completed) is
    /// partitioned again. The session returns to
    /// [`SessionState::Scheduled`].
    ///
    /// # Errors
    ///
    /// Returns a validation error while the session is running.
    pub async fn reset(&self) -> Result<()> {
        if self.state().is_running() {
            return Err(BackfillError::Validation(format!(
                "Session '{}' is running; pause it before resetting",
                self.inner.id
            )));
        }

        let categories = known_categories(&lock(&self.inner.descriptor));
        let mut fresh = Descriptor::new(self.inner.id.clone(), Utc::now());
        add_categories(
            &mut fresh,
            &categories,
            self.inner.source.as_ref(),
            &self.inner.settings,
        )
        .await;

        if self.state().is_running() {
            return Err(BackfillError::Validation(format!(
                "Session '{}' was started during reset",
                self.inner.id
            )));
        }

        tracing::info!(
            session_id = %self.inner.id,
            pending = fresh.pending_len(),
            "Session descriptor reset"
        );
        *lock(&self.inner.descriptor) = fresh;
        self.inner.persist().await;
        self.inner.state_tx.send_replace(SessionState::Scheduled);
        Ok(())
    }
}

impl<P: Processor> fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("processor", &self.processor_name())
            .field("state", &self.state())
            .finish()
    }
}

impl<P: Processor> Inner<P> {
    async fn run(self: Arc<Self>, token: CancellationToken, generation: u64) {
        tracing::info!(
            session_id = %self.id,
            pending = lock(&self.descriptor).pending_len(),
            "Export run started"
        );

        let mut run_completed = 0usize;

        loop {
            if token.is_cancelled() {
                self.finish(generation, SessionState::Paused);
                return;
            }

            let (next, mutated) = self.select_next();
            if mutated {
                self.persist().await;
            }

            let Some(batch) = next else {
                let state = if token.is_cancelled() {
                    SessionState::Paused
                } else {
                    SessionState::Done
                };
                self.finish(generation, state);
                return;
            };

            let index = run_completed + 1;
            let total = run_completed + lock(&self.descriptor).pending_len();
            self.progress_tx.send_replace(Some(ProgressSnapshot::for_batch(
                &batch,
                index,
                total,
                *lock(&self.counters),
            )));
            crate::log_batch_start!(&self.id, &batch, index, total);

            match self.attempt(&batch).await {
                Ok(()) => {
                    run_completed += 1;
                    self.record_success(&batch);
                }
                Err(failure) => self.record_failure(&batch, &failure),
            }

            self.persist().await;
        }
    }

    /// Pick the next batch to attempt. Returns the batch (if any) and
    /// whether the queue was changed in the process.
    fn select_next(&self) -> (Option<Batch>, bool) {
        let mut descriptor = lock(&self.descriptor);
        let mut mutated = false;

        for batch in descriptor.purge_exhausted() {
            crate::log_batch_dropped!(&self.id, &batch, "retry budget already spent");
            lock(&self.counters).dropped += 1;
            mutated = true;
        }

        let head_ready = descriptor
            .pending_batches()
            .front()
            .is_some_and(Batch::is_eligible);
        if let Some(batch) = descriptor.promote_next_eligible() {
            return (Some(batch), mutated || !head_ready);
        }

        if descriptor.has_deferred_batches() {
            descriptor.clear_skip_flags();
            tracing::info!(
                session_id = %self.id,
                pending = descriptor.pending_len(),
                "Starting next retry pass"
            );
            return (descriptor.promote_next_eligible(), true);
        }

        (None, mutated)
    }

    async fn attempt(&self, batch: &Batch) -> std::result::Result<(), BatchFailure> {
        let records = self
            .source
            .fetch_records(&batch.category, &batch.window)
            .await
            .map_err(BatchFailure::Query)?;
        let record_count = records.len();

        let output = self
            .processor
            .process(records, &batch.category)
            .await
            .map_err(BatchFailure::Process)?;

        match self.handler.handle(output).await {
            Delivery::Accept => {
                tracing::debug!(
                    session_id = %self.id,
                    category = %batch.category,
                    window = %batch.window.label(),
                    records = record_count,
                    "Batch delivered"
                );
                Ok(())
            }
            Delivery::Retry => Err(BatchFailure::Rejected),
        }
    }

    fn record_success(&self, batch: &Batch) {
        let finished = lock(&self.descriptor).complete_batch(batch);
        lock(&self.counters).completed += 1;

        if let Some(category) = finished {
            tracing::info!(session_id = %self.id, category = %category, "Category export complete");
        }
    }

    /// Requeue or drop a failed batch. A drop shrinks the run total, which
    /// the next batch's snapshot reflects.
    fn record_failure(&self, batch: &Batch, failure: &BatchFailure) {
        let outcome = lock(&self.descriptor).fail_batch(batch);
        lock(&self.counters).failed_attempts += 1;

        match outcome {
            Some(FailureOutcome::Requeued { remaining }) => {
                crate::log_retry_attempt!(&self.id, batch, remaining, failure);
            }
            Some(FailureOutcome::Dropped { category_finished }) => {
                lock(&self.counters).dropped += 1;
                crate::log_batch_dropped!(&self.id, batch, failure);
                if category_finished {
                    tracing::info!(
                        session_id = %self.id,
                        category = %batch.category,
                        "Category has no pending batches left"
                    );
                }
            }
            None => {
                tracing::warn!(
                    session_id = %self.id,
                    category = %batch.category,
                    window = %batch.window.label(),
                    "Failed batch is no longer queued"
                );
            }
        }
    }

    async fn persist(&self) {
        let snapshot = lock(&self.descriptor).clone();
        if !checkpoint(&self.state_manager, &snapshot).await {
            lock(&self.counters).persistence_failures += 1;
        }
    }

    fn finish(&self, generation: u64, state: SessionState) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(session_id = %self.id, "Superseded run exiting");
            return;
        }

        self.progress_tx.send_replace(None);
        self.state_tx.send_replace(state);

        let counters = *lock(&self.counters);
        tracing::info!(
            session_id = %self.id,
            state = %state,
            pending = lock(&self.descriptor).pending_len(),
            completed = counters.completed,
            failed_attempts = counters.failed_attempts,
            dropped = counters.dropped,
            "Export run stopped"
        );
    }
}

/// Write the descriptor, logging instead of failing. Returns whether the
/// write succeeded.
async fn checkpoint(state_manager: &StateManager, descriptor: &Descriptor) -> bool {
    match state_manager.checkpoint(descriptor).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                session_id = %descriptor.session_id,
                error = %e,
                "Failed to persist descriptor"
            );
            false
        }
    }
}

/// Earliest record instant for `category`, or the fallback epoch
async fn resolve_earliest(
    source: &(dyn DataSource + Send + Sync),
    category: &Category,
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    match source.earliest_record_instant(category).await {
        Ok(Some(earliest)) => earliest,
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!(
                category = %category,
                error = %e,
                fallback = %fallback,
                "Earliest record lookup failed, using fallback epoch"
            );
            fallback
        }
    }
}

/// Partition every category the descriptor does not represent yet.
/// Returns whether the descriptor changed.
async fn add_categories(
    descriptor: &mut Descriptor,
    categories: &[Category],
    source: &(dyn DataSource + Send + Sync),
    settings: &SessionSettings,
) -> bool {
    let mut changed = false;
    for category in categories {
        if descriptor.is_represented(category) {
            continue;
        }
        let earliest = resolve_earliest(source, category, settings.fallback_epoch).await;
        let added = descriptor.add_category(category, earliest, settings.retry_budget);
        tracing::debug!(
            session_id = %descriptor.session_id,
            category = %category,
            earliest = %earliest,
            batches = added,
            "Partitioned category"
        );
        changed = true;
    }
    changed
}

/// Categories named by the descriptor: pending ones in queue order, then
/// completed ones
fn known_categories(descriptor: &Descriptor) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for batch in descriptor.pending_batches() {
        if !categories.contains(&batch.category) {
            categories.push(batch.category.clone());
        }
    }
    for category in descriptor.completed_categories() {
        if !categories.contains(category) {
            categories.push(category.clone());
        }
    }
    categories
}

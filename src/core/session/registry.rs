//! Session registry
//!
//! Creates or resumes sessions by id and guarantees that at most one live
//! [`Session`] exists per id. Sessions with different processor types are
//! stored side by side behind the object-safe [`ManagedSession`] trait and
//! recovered by downcasting.

use crate::adapters::processor::{Processor, ResultHandler};
use crate::adapters::source::DataSource;
use crate::core::descriptor::Descriptor;
use crate::core::session::session::{Session, SessionSettings};
use crate::core::session::state::{ExportCounters, ProgressSnapshot, SessionState};
use crate::core::state::StateManager;
use crate::domain::ids::{Category, SessionId};
use crate::domain::{BackfillError, Result};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Processor-independent view of a live session
#[async_trait]
pub trait ManagedSession: Send + Sync {
    /// Session id
    fn session_id(&self) -> &SessionId;

    /// Name of the bound processor
    fn processor_name(&self) -> &'static str;

    /// Current lifecycle state
    fn state(&self) -> SessionState;

    /// Progress of the batch in flight
    fn progress(&self) -> Option<ProgressSnapshot>;

    /// Running totals
    fn counters(&self) -> ExportCounters;

    /// Start or resume the run loop
    fn start(&self);

    /// Request a cooperative pause
    fn pause(&self);

    /// Wait until the run loop has stopped
    async fn wait_until_idle(&self);

    /// Upcast for recovering the concrete session type
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

#[async_trait]
impl<P: Processor> ManagedSession for Session<P> {
    fn session_id(&self) -> &SessionId {
        self.id()
    }

    fn processor_name(&self) -> &'static str {
        Session::processor_name(self)
    }

    fn state(&self) -> SessionState {
        Session::state(self)
    }

    fn progress(&self) -> Option<ProgressSnapshot> {
        Session::progress(self)
    }

    fn counters(&self) -> ExportCounters {
        Session::counters(self)
    }

    fn start(&self) {
        Session::start(self);
    }

    fn pause(&self) {
        Session::pause(self);
    }

    async fn wait_until_idle(&self) {
        Session::wait_until_idle(self).await;
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Registry of live sessions sharing one data source and persistence store
pub struct SessionRegistry {
    source: Arc<dyn DataSource + Send + Sync>,
    state_manager: StateManager,
    settings: SessionSettings,
    sessions: Mutex<HashMap<SessionId, Arc<dyn ManagedSession>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("state_manager", &self.state_manager)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(
        source: Arc<dyn DataSource + Send + Sync>,
        state_manager: StateManager,
        settings: SessionSettings,
    ) -> Self {
        Self {
            source,
            state_manager,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Settings applied to new and resumed descriptors
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Return the live session for `session_id`, or load/build and register one
    ///
    /// A live session is returned as-is (its queue and progress untouched) when
    /// its processor type is `P`. A new session is started right away when
    /// `auto_start` is set.
    ///
    /// # Errors
    ///
    /// * [`BackfillError::ConflictingSessionType`] if the live session is bound
    ///   to a different processor type
    /// * [`BackfillError::Persistence`] if a stored descriptor cannot be read
    pub async fn get_or_create_session<P: Processor>(
        &self,
        session_id: SessionId,
        categories: &[Category],
        processor: P,
        auto_start: bool,
        handler: Arc<dyn ResultHandler<P::Output>>,
    ) -> Result<Arc<Session<P>>> {
        let mut sessions = self.sessions.lock().await;

        if let Some(existing) = sessions.get(&session_id) {
            let existing_name = existing.processor_name();
            return Arc::clone(existing)
                .as_any()
                .downcast::<Session<P>>()
                .map_err(|_| BackfillError::ConflictingSessionType {
                    session_id: session_id.to_string(),
                    existing: existing_name.to_string(),
                    requested: processor.name().to_string(),
                })
                .inspect(|_| {
                    tracing::debug!(session_id = %session_id, "Reusing live session");
                });
        }

        let categories = dedup(categories);
        let session = Arc::new(
            Session::open(
                session_id.clone(),
                &categories,
                processor,
                handler,
                Arc::clone(&self.source),
                self.state_manager.clone(),
                self.settings.clone(),
            )
            .await?,
        );

        sessions.insert(session_id.clone(), session.clone() as Arc<dyn ManagedSession>);
        tracing::info!(
            session_id = %session_id,
            processor = session.processor_name(),
            auto_start,
            "Session registered"
        );

        if auto_start {
            session.start();
        }
        Ok(session)
    }

    /// Live session for `session_id`, if it exists and is bound to `P`
    pub async fn get<P: Processor>(&self, session_id: &SessionId) -> Option<Arc<Session<P>>> {
        let sessions = self.sessions.lock().await;
        let existing = Arc::clone(sessions.get(session_id)?);
        existing.as_any().downcast::<Session<P>>().ok()
    }

    /// Purge the persisted descriptor for `session_id`
    ///
    /// A live session is paused, waited for and evicted first so it cannot
    /// write the descriptor back. The registry stays locked until the
    /// descriptor is gone, so a concurrent `get_or_create_session` for the
    /// same id waits and then starts from scratch. Deleting an absent
    /// descriptor is not an error.
    pub async fn delete_session_state(&self, session_id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.remove(session_id) {
            session.pause();
            session.wait_until_idle().await;
            tracing::info!(session_id = %session_id, "Live session evicted");
        }

        self.state_manager.delete_descriptor(session_id).await?;
        drop(sessions);

        tracing::info!(session_id = %session_id, "Session state deleted");
        Ok(())
    }

    /// Every readable descriptor in the persistence store
    pub async fn list_persisted(&self) -> Result<Vec<Descriptor>> {
        self.state_manager.get_all_descriptors().await
    }

    /// Ids of the live sessions, sorted
    pub async fn live_sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Pause every live session and wait until all of them are idle
    pub async fn pause_all(&self) {
        let sessions: Vec<Arc<dyn ManagedSession>> =
            self.sessions.lock().await.values().cloned().collect();

        for session in &sessions {
            session.pause();
        }
        futures::future::join_all(sessions.iter().map(|s| s.wait_until_idle())).await;

        tracing::info!(count = sessions.len(), "All sessions idle");
    }
}

/// Drop repeated categories, keeping first occurrence order
fn dedup(categories: &[Category]) -> Vec<Category> {
    let mut unique: Vec<Category> = Vec::with_capacity(categories.len());
    for category in categories {
        if !unique.contains(category) {
            unique.push(category.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::processor::Delivery;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::window::TimeWindow;
    use crate::domain::Record;
    use chrono::{DateTime, Utc};

    struct EmptySource;

    #[async_trait]
    impl DataSource for EmptySource {
        async fn earliest_record_instant(&self, _: &Category) -> Result<Option<DateTime<Utc>>> {
            Ok(Some(Utc::now() - chrono::Duration::days(10)))
        }

        async fn fetch_records(&self, _: &Category, _: &TimeWindow) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }
    }

    struct Counter;

    #[async_trait]
    impl Processor for Counter {
        type Output = usize;

        async fn process(&self, records: Vec<Record>, _: &Category) -> Result<usize> {
            Ok(records.len())
        }
    }

    struct Labeler;

    #[async_trait]
    impl Processor for Labeler {
        type Output = String;

        async fn process(&self, _: Vec<Record>, category: &Category) -> Result<String> {
            Ok(category.to_string())
        }

        fn name(&self) -> &'static str {
            "Labeler"
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(EmptySource),
            StateManager::new_with_storage(Arc::new(MemoryStorage::new())),
            SessionSettings::default(),
        )
    }

    fn categories(names: &[&str]) -> Vec<Category> {
        names.iter().map(|n| Category::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_dedup_keeps_order() {
        let unique = dedup(&categories(&["b", "a", "b", "c", "a"]));
        let names: Vec<&str> = unique.iter().map(Category::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_get_returns_typed_session() {
        let registry = registry();
        let id = SessionId::new("s1").unwrap();
        registry
            .get_or_create_session(
                id.clone(),
                &categories(&["a"]),
                Counter,
                false,
                Arc::new(|_: usize| Delivery::Accept),
            )
            .await
            .unwrap();

        assert!(registry.get::<Counter>(&id).await.is_some());
        assert!(registry.get::<Labeler>(&id).await.is_none());
        assert_eq!(registry.live_sessions().await, vec![id]);
    }

    #[tokio::test]
    async fn test_conflicting_type_names_both_processors() {
        let registry = registry();
        let id = SessionId::new("s1").unwrap();
        registry
            .get_or_create_session(
                id.clone(),
                &categories(&["a"]),
                Labeler,
                false,
                Arc::new(|_: String| Delivery::Accept),
            )
            .await
            .unwrap();

        let err = registry
            .get_or_create_session(
                id,
                &categories(&["a"]),
                Counter,
                false,
                Arc::new(|_: usize| Delivery::Accept),
            )
            .await
            .unwrap_err();

        match err {
            BackfillError::ConflictingSessionType {
                session_id,
                existing,
                requested,
            } => {
                assert_eq!(session_id, "s1");
                assert_eq!(existing, "Labeler");
                assert!(requested.ends_with("Counter"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_evicts_live_session() {
        let registry = registry();
        let id = SessionId::new("s1").unwrap();
        registry
            .get_or_create_session(
                id.clone(),
                &categories(&["a"]),
                Counter,
                false,
                Arc::new(|_: usize| Delivery::Accept),
            )
            .await
            .unwrap();
        assert_eq!(registry.list_persisted().await.unwrap().len(), 1);

        registry.delete_session_state(&id).await.unwrap();
        assert!(registry.live_sessions().await.is_empty());
        assert!(registry.list_persisted().await.unwrap().is_empty());

        registry.delete_session_state(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_all_with_no_sessions() {
        let registry = registry();
        registry.pause_all().await;
        assert!(registry.live_sessions().await.is_empty());
    }
}

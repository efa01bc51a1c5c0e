//! Integration tests for descriptor persistence and resume
//!
//! Sessions write their descriptors through a file-backed store; a second
//! registry over the same directory must pick up exactly where the first one
//! stopped.

mod common;

use backfill::adapters::{Delivery, FileStorage, ResultHandler};
use backfill::core::descriptor::Descriptor;
use backfill::core::session::{SessionRegistry, SessionState};
use backfill::core::state::StateManager;
use backfill::domain::window::start_of_year;
use backfill::domain::BackfillError;
use chrono::Utc;
use common::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn file_registry(dir: &Path, budget: u32) -> SessionRegistry {
    let storage = FileStorage::new(dir).await.unwrap();
    SessionRegistry::new(
        ScriptedSource::new(this_year()),
        StateManager::new_with_storage(Arc::new(storage)),
        settings(budget),
    )
}

async fn file_manager(dir: &Path) -> StateManager {
    StateManager::new_with_storage(Arc::new(FileStorage::new(dir).await.unwrap()))
}

fn accept() -> Arc<dyn ResultHandler<String>> {
    Arc::new(|_: String| Delivery::Accept)
}

#[tokio::test]
async fn test_descriptor_round_trip_through_file_storage() {
    let temp_dir = TempDir::new().unwrap();
    let manager = file_manager(temp_dir.path()).await;

    let mut descriptor = Descriptor::new(session_id("round-trip"), Utc::now());
    descriptor.add_category(&category("heart_rate"), start_of_year(2020).unwrap(), 3);
    descriptor.add_category(&category("step_count"), Utc::now(), 3);
    let first = descriptor.pending_batches().front().cloned().unwrap();
    descriptor.fail_batch(&first);

    manager.save_descriptor(&descriptor).await.unwrap();
    let loaded = manager
        .load_descriptor(&session_id("round-trip"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(loaded, descriptor);
    assert!(loaded.completed_categories().contains(&category("step_count")));
    let tail = loaded.pending_batches().back().unwrap();
    assert_eq!(tail.remaining_retries, 2);
    assert!(tail.skip_until_next_attempt);
}

#[tokio::test]
async fn test_resume_keeps_retries_and_clears_skip_flags() {
    let temp_dir = TempDir::new().unwrap();

    {
        let registry = file_registry(temp_dir.path(), 3).await;
        let script = ProcessorScript::new();
        script.fail("b", ALWAYS);
        let (entered, release) = script.gate("b");

        let session = registry
            .get_or_create_session(
                session_id("resumable"),
                &categories(&["a", "b"]),
                ScriptedProcessor(script.clone()),
                true,
                accept(),
            )
            .await
            .unwrap();

        within(entered.notified()).await;
        session.pause();
        release.notify_one();
        within(session.wait_until_idle()).await;

        assert_eq!(session.state(), SessionState::Paused);
        assert_eq!(script.attempts("b"), 1);
    }

    let stored = file_manager(temp_dir.path())
        .await
        .load_descriptor(&session_id("resumable"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.pending_len(), 1);
    assert!(stored.pending_batches()[0].skip_until_next_attempt);

    let registry = file_registry(temp_dir.path(), 3).await;
    let script = ProcessorScript::new();
    let session = registry
        .get_or_create_session(
            session_id("resumable"),
            &categories(&["a", "b"]),
            ScriptedProcessor(script.clone()),
            false,
            accept(),
        )
        .await
        .unwrap();

    let pending = session.pending_batches();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].category, category("b"));
    assert_eq!(pending[0].remaining_retries, 2);
    assert!(!pending[0].skip_until_next_attempt);
    assert!(session
        .descriptor()
        .completed_categories()
        .contains(&category("a")));
    assert_eq!(session.descriptor().export_end, stored.export_end);

    session.start();
    within(session.wait_until_idle()).await;

    assert_eq!(session.state(), SessionState::Done);
    assert_eq!(script.attempts("a"), 0);
    assert_eq!(script.attempts("b"), 1);
}

#[tokio::test]
async fn test_resume_appends_new_categories_with_persisted_end() {
    let temp_dir = TempDir::new().unwrap();

    let export_end = {
        let registry = file_registry(temp_dir.path(), 3).await;
        let session = registry
            .get_or_create_session(
                session_id("growing"),
                &categories(&["a"]),
                ScriptedProcessor(ProcessorScript::new()),
                false,
                accept(),
            )
            .await
            .unwrap();
        session.descriptor().export_end
    };

    let registry = file_registry(temp_dir.path(), 3).await;
    let session = registry
        .get_or_create_session(
            session_id("growing"),
            &categories(&["a", "c"]),
            ScriptedProcessor(ProcessorScript::new()),
            false,
            accept(),
        )
        .await
        .unwrap();

    let descriptor = session.descriptor();
    assert_eq!(descriptor.export_end, export_end);

    let pending: Vec<String> = descriptor
        .pending_batches()
        .iter()
        .map(|b| b.category.to_string())
        .collect();
    assert_eq!(pending, vec!["a", "c"]);
    assert!(descriptor
        .pending_batches()
        .iter()
        .all(|b| b.window.end <= export_end));

    let stored = file_manager(temp_dir.path())
        .await
        .load_descriptor(&session_id("growing"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, descriptor);
}

#[tokio::test]
async fn test_delete_session_state_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let registry = file_registry(temp_dir.path(), 3).await;

    registry
        .get_or_create_session(
            session_id("disposable"),
            &categories(&["a"]),
            ScriptedProcessor(ProcessorScript::new()),
            false,
            accept(),
        )
        .await
        .unwrap();
    assert!(temp_dir.path().join("disposable.json").exists());

    registry
        .delete_session_state(&session_id("disposable"))
        .await
        .unwrap();
    assert!(!temp_dir.path().join("disposable.json").exists());
    assert!(registry.live_sessions().await.is_empty());
    assert!(registry.list_persisted().await.unwrap().is_empty());

    registry
        .delete_session_state(&session_id("disposable"))
        .await
        .unwrap();
    registry
        .delete_session_state(&session_id("never-existed"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_stops_running_session_before_purging() {
    let temp_dir = TempDir::new().unwrap();
    let registry = file_registry(temp_dir.path(), 3).await;
    let script = ProcessorScript::new();
    let (entered, release) = script.gate("a");

    let session = registry
        .get_or_create_session(
            session_id("running"),
            &categories(&["a", "b"]),
            ScriptedProcessor(script.clone()),
            true,
            accept(),
        )
        .await
        .unwrap();
    within(entered.notified()).await;

    let id = session_id("running");
    within(async {
        let (deleted, ()) = tokio::join!(registry.delete_session_state(&id), async {
            release.notify_one()
        });
        deleted.unwrap();
    })
    .await;

    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(script.attempts("b"), 0);
    assert!(!temp_dir.path().join("running.json").exists());
}

#[tokio::test]
async fn test_list_persisted_returns_every_session() {
    let temp_dir = TempDir::new().unwrap();
    let registry = file_registry(temp_dir.path(), 3).await;

    for id in ["beta", "alpha"] {
        registry
            .get_or_create_session(
                session_id(id),
                &categories(&["a"]),
                ScriptedProcessor(ProcessorScript::new()),
                false,
                accept(),
            )
            .await
            .unwrap();
    }
    std::fs::write(temp_dir.path().join("notes.txt"), "not a descriptor").unwrap();

    let ids: Vec<String> = registry
        .list_persisted()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.session_id.to_string())
        .collect();
    assert_eq!(ids, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_corrupt_descriptor_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
    let registry = file_registry(temp_dir.path(), 3).await;

    let result = registry
        .get_or_create_session(
            session_id("broken"),
            &categories(&["a"]),
            ScriptedProcessor(ProcessorScript::new()),
            false,
            accept(),
        )
        .await;

    assert!(matches!(result, Err(BackfillError::Persistence(_))));
    assert!(registry.live_sessions().await.is_empty());
}

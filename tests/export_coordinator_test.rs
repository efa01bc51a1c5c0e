//! Integration tests for the export coordinator
//!
//! These tests verify that:
//! - A configured export runs end to end from JSON-lines files to JSON output
//! - A shutdown signal pauses the export and saves progress
//! - A later run resumes from the saved descriptor
//! - `auto_start = false` only prepares the batch queue

use backfill::adapters::FileStorage;
use backfill::config::{parse_config, BackfillConfig};
use backfill::core::export::ExportCoordinator;
use backfill::core::session::SessionState;
use backfill::core::state::StateManager;
use backfill::domain::{Record, SessionId};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn write_records(dir: &Path, category: &str, records: &[Record]) {
    let lines: Vec<String> = records
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect();
    std::fs::write(dir.join(format!("{category}.jsonl")), lines.join("\n")).unwrap();
}

/// Temp workspace with two categories of source data
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    write_records(
        &data,
        "heart_rate",
        &[
            Record::new(ymd(2022, 3, 1), ymd(2022, 3, 1), 64.0).with_unit("count/min"),
            Record::new(ymd(2022, 7, 1), ymd(2022, 7, 1), 71.0).with_unit("count/min"),
            Record::new(ymd(2023, 5, 1), ymd(2023, 5, 1), 68.0).with_unit("count/min"),
        ],
    );
    write_records(
        &data,
        "step_count",
        &[Record::new(ymd(2023, 2, 1), ymd(2023, 2, 2), 9120.0)],
    );
    temp_dir
}

fn config(root: &Path, auto_start: bool) -> BackfillConfig {
    let contents = format!(
        r#"
[export]
session_id = "health-export"
categories = ["heart_rate", "step_count"]
auto_start = {auto_start}

[source]
path = "{data}"

[output]
path = "{output}"

[state]
backend = "file"
path = "{state}"
"#,
        data = root.join("data").display(),
        output = root.join("export").display(),
        state = root.join("state").display(),
    );
    parse_config(&contents).unwrap()
}

/// Batches for a category whose history starts in `first_year`
fn years_since(first_year: i32) -> usize {
    (Utc::now().year() - first_year + 1) as usize
}

#[tokio::test]
async fn test_export_runs_end_to_end() {
    let temp_dir = workspace();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let coordinator = ExportCoordinator::new(config(temp_dir.path(), true), shutdown_rx)
        .await
        .unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.final_state, SessionState::Done);
    assert!(summary.is_successful());
    assert_eq!(
        summary.counters.completed,
        years_since(2022) + years_since(2023)
    );
    assert_eq!(summary.remaining_batches, 0);
    assert_eq!(summary.completed_categories, 2);
    assert_eq!(summary.records_exported, 4);
    assert_eq!(summary.files_written, 3);

    let export = temp_dir.path().join("export");
    let heart_rate = export.join("heart_rate").join("20220301_20220701.json");
    assert!(heart_rate.exists());
    assert!(export.join("heart_rate").join("20230501_20230501.json").exists());
    assert!(export.join("step_count").join("20230201_20230201.json").exists());

    let document: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&heart_rate).unwrap()).unwrap();
    assert_eq!(document["category"], "heart_rate");
    assert_eq!(document["record_count"], 2);
    assert_eq!(document["records"][0]["unit"], "count/min");

    let storage = FileStorage::new(temp_dir.path().join("state")).await.unwrap();
    let stored = StateManager::new_with_storage(Arc::new(storage))
        .load_descriptor(&SessionId::new("health-export").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_finished());
}

#[tokio::test]
async fn test_shutdown_pauses_and_next_run_resumes() {
    let temp_dir = workspace();
    let total_batches = years_since(2022) + years_since(2023);

    // Signalled before the run starts: the session pauses at its first boundary
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();
    let coordinator = ExportCoordinator::new(config(temp_dir.path(), true), shutdown_rx)
        .await
        .unwrap();
    let interrupted = coordinator.execute_export().await.unwrap();

    assert!(interrupted.interrupted());
    assert_eq!(interrupted.final_state, SessionState::Paused);
    assert_eq!(
        interrupted.remaining_batches + interrupted.counters.completed,
        total_batches
    );
    assert!(temp_dir.path().join("state").join("health-export.json").exists());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let coordinator = ExportCoordinator::new(config(temp_dir.path(), true), shutdown_rx)
        .await
        .unwrap();
    let resumed = coordinator.execute_export().await.unwrap();

    assert_eq!(resumed.final_state, SessionState::Done);
    assert_eq!(resumed.remaining_batches, 0);
    assert_eq!(
        interrupted.counters.completed + resumed.counters.completed,
        total_batches
    );
    assert!(temp_dir
        .path()
        .join("export")
        .join("step_count")
        .join("20230201_20230201.json")
        .exists());
}

#[tokio::test]
async fn test_prepare_only_persists_queue_without_running() {
    let temp_dir = workspace();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let coordinator = ExportCoordinator::new(config(temp_dir.path(), false), shutdown_rx)
        .await
        .unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.final_state, SessionState::Scheduled);
    assert_eq!(summary.counters.completed, 0);
    assert_eq!(
        summary.remaining_batches,
        years_since(2022) + years_since(2023)
    );
    assert_eq!(summary.files_written, 0);
    assert!(!temp_dir.path().join("export").exists());

    let persisted = coordinator.registry().list_persisted().await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].pending_len(), summary.remaining_batches);
}

#[tokio::test]
async fn test_missing_category_file_completes_without_output() {
    let temp_dir = workspace();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut config = config(temp_dir.path(), true);
    config.export.categories = vec!["blood_glucose".to_string()];
    config.export.fallback_epoch = Utc::now() - chrono::Duration::days(1);

    let coordinator = ExportCoordinator::new(config, shutdown_rx).await.unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.final_state, SessionState::Done);
    assert_eq!(summary.records_exported, 0);
    assert_eq!(summary.files_written, 0);
    assert_eq!(summary.counters.dropped, 0);
}

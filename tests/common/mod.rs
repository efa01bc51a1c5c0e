//! Scripted collaborators shared by the integration tests
//!
//! [`ScriptedSource`] hands out one record per batch window and
//! [`ScriptedProcessor`] fails, blocks or records progress on demand.

#![allow(dead_code)]

use async_trait::async_trait;
use backfill::adapters::{DataSource, Processor};
use backfill::core::session::{ProgressSnapshot, SessionSettings};
use backfill::domain::window::start_of_year;
use backfill::domain::{BackfillError, Category, Record, Result, SessionId, TimeWindow};
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Failure count meaning "fail on every attempt"
pub const ALWAYS: usize = usize::MAX;

pub fn category(name: &str) -> Category {
    Category::new(name).unwrap()
}

pub fn categories(names: &[&str]) -> Vec<Category> {
    names.iter().map(|n| category(n)).collect()
}

pub fn session_id(id: &str) -> SessionId {
    SessionId::new(id).unwrap()
}

pub fn settings(retry_budget: u32) -> SessionSettings {
    SessionSettings {
        retry_budget,
        ..SessionSettings::default()
    }
}

/// Start of the current year; categories starting here get exactly one batch
pub fn this_year() -> DateTime<Utc> {
    start_of_year(Utc::now().year()).unwrap()
}

/// Await `future`, failing the test if it takes longer than five seconds
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

/// Data source with a fixed earliest instant and optional fetch failures
pub struct ScriptedSource {
    earliest: Option<DateTime<Utc>>,
    fetch_failures: Mutex<HashMap<String, usize>>,
    fetches: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(earliest: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            earliest: Some(earliest),
            fetch_failures: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        })
    }

    /// Source that knows no earliest instant, forcing the fallback epoch
    pub fn without_history() -> Arc<Self> {
        Arc::new(Self {
            earliest: None,
            fetch_failures: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_fetches(&self, category: &str, times: usize) {
        self.fetch_failures
            .lock()
            .unwrap()
            .insert(category.to_string(), times);
    }

    /// Categories fetched so far, in order
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn earliest_record_instant(&self, _: &Category) -> Result<Option<DateTime<Utc>>> {
        Ok(self.earliest)
    }

    async fn fetch_records(&self, category: &Category, window: &TimeWindow) -> Result<Vec<Record>> {
        self.fetches.lock().unwrap().push(category.to_string());
        if take_failure(&self.fetch_failures, category) {
            return Err(BackfillError::Query(format!("source unavailable for {category}")));
        }
        Ok(vec![Record::new(window.start, window.start, 1.0)])
    }
}

/// Blocks the first attempt of one category until released
pub struct Gate {
    category: String,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

/// Behaviour shared between a test and the processor it handed to a session
#[derive(Default)]
pub struct ProcessorScript {
    failures: Mutex<HashMap<String, usize>>,
    attempts: Mutex<HashMap<String, usize>>,
    progress: Mutex<Option<watch::Receiver<Option<ProgressSnapshot>>>>,
    observed: Mutex<Vec<ProgressSnapshot>>,
    gate: Mutex<Option<Gate>>,
}

impl ProcessorScript {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` attempts for `category` (`ALWAYS` for every one)
    pub fn fail(&self, category: &str, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(category.to_string(), times);
    }

    pub fn attempts(&self, category: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(category)
            .copied()
            .unwrap_or(0)
    }

    /// Record the published progress snapshot at every attempt
    pub fn watch_progress(&self, progress: watch::Receiver<Option<ProgressSnapshot>>) {
        *self.progress.lock().unwrap() = Some(progress);
    }

    pub fn observed(&self) -> Vec<ProgressSnapshot> {
        self.observed.lock().unwrap().clone()
    }

    /// Hold the first attempt of `category`. Returns `(entered, release)`:
    /// `entered` is notified once the attempt starts, notifying `release`
    /// lets it finish.
    pub fn gate(&self, category: &str) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Gate {
            category: category.to_string(),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        (entered, release)
    }
}

/// Processor whose output is the category name
pub struct ScriptedProcessor(pub Arc<ProcessorScript>);

#[async_trait]
impl Processor for ScriptedProcessor {
    type Output = String;

    async fn process(&self, _records: Vec<Record>, category: &Category) -> Result<String> {
        let script = &self.0;
        {
            let mut attempts = script.attempts.lock().unwrap();
            *attempts.entry(category.to_string()).or_default() += 1;
        }
        {
            let snapshot = script
                .progress
                .lock()
                .unwrap()
                .as_ref()
                .and_then(|rx| rx.borrow().clone());
            if let Some(snapshot) = snapshot {
                script.observed.lock().unwrap().push(snapshot);
            }
        }

        let gate = {
            let mut gate = script.gate.lock().unwrap();
            if gate.as_ref().is_some_and(|g| g.category == category.as_str()) {
                gate.take()
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if take_failure(&script.failures, category) {
            return Err(BackfillError::Process(format!("scripted failure for {category}")));
        }
        Ok(category.to_string())
    }

    fn name(&self) -> &'static str {
        "ScriptedProcessor"
    }
}

/// A second processor type, for conflicting-type checks
pub struct CountingProcessor;

#[async_trait]
impl Processor for CountingProcessor {
    type Output = usize;

    async fn process(&self, records: Vec<Record>, _: &Category) -> Result<usize> {
        Ok(records.len())
    }

    fn name(&self) -> &'static str {
        "CountingProcessor"
    }
}

fn take_failure(failures: &Mutex<HashMap<String, usize>>, category: &Category) -> bool {
    let mut failures = failures.lock().unwrap();
    match failures.get_mut(category.as_str()) {
        Some(remaining) if *remaining == ALWAYS => true,
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

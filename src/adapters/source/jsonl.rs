//! JSON-lines directory data source
//!
//! Reads `<dir>/<category>.jsonl`, one [`Record`] per line. A missing file
//! means the category has no history.

use super::traits::DataSource;
use crate::domain::ids::Category;
use crate::domain::window::TimeWindow;
use crate::domain::{BackfillError, Record, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// [`DataSource`] over a directory of JSON-lines files
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    dir: PathBuf,
}

impl JsonLinesSource {
    /// Create a source rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, category: &Category) -> PathBuf {
        self.dir.join(format!("{}.jsonl", category.as_str()))
    }

    async fn read_category(&self, category: &Category) -> Result<Vec<Record>> {
        let path = self.path_for(category);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(category = %category, path = %path.display(), "No data file for category");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(BackfillError::Query(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        parse_lines(&contents).map_err(|e| {
            BackfillError::Query(format!("Malformed record in {}: {e}", path.display()))
        })
    }
}

fn parse_lines(contents: &str) -> std::result::Result<Vec<Record>, String> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Record>(line).map_err(|e| format!("line {}: {e}", index + 1))
        })
        .collect()
}

#[async_trait]
impl DataSource for JsonLinesSource {
    async fn earliest_record_instant(&self, category: &Category) -> Result<Option<DateTime<Utc>>> {
        let records = self.read_category(category).await?;
        Ok(records.iter().map(|r| r.start).min())
    }

    async fn fetch_records(&self, category: &Category, window: &TimeWindow) -> Result<Vec<Record>> {
        let mut records: Vec<Record> = self
            .read_category(category)
            .await?
            .into_iter()
            .filter(|r| window.contains(r.start))
            .collect();
        records.sort_by_key(|r| r.start);

        tracing::debug!(
            category = %category,
            window = %window.label(),
            count = records.len(),
            "Fetched records"
        );
        Ok(records)
    }
}

//! JSON file exporter
//!
//! Writes every batch to `<dir>/<category>/<first>_<last>.json`, named by the
//! first and last record dates. Re-delivering a batch overwrites the same
//! file, which keeps at-least-once delivery harmless.

use super::traits::Processor;
use crate::domain::ids::Category;
use crate::domain::{BackfillError, Record, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

/// Output of [`JsonFileExporter`] for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    /// Category of the batch
    pub category: Category,
    /// File written, `None` for an empty batch
    pub path: Option<PathBuf>,
    /// Number of records written
    pub record_count: usize,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    category: &'a Category,
    record_count: usize,
    records: &'a [Record],
}

/// [`Processor`] writing each batch as a pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonFileExporter {
    dir: PathBuf,
}

impl JsonFileExporter {
    /// Create an exporter writing under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Processor for JsonFileExporter {
    type Output = ExportedFile;

    async fn process(&self, records: Vec<Record>, category: &Category) -> Result<ExportedFile> {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Ok(ExportedFile {
                category: category.clone(),
                path: None,
                record_count: 0,
            });
        };

        let category_dir = self.dir.join(category.as_str());
        tokio::fs::create_dir_all(&category_dir).await.map_err(|e| {
            BackfillError::Process(format!(
                "Failed to create {}: {e}",
                category_dir.display()
            ))
        })?;

        let file_name = format!(
            "{}_{}.json",
            first.start.format("%Y%m%d"),
            last.start.format("%Y%m%d")
        );
        let path = category_dir.join(file_name);

        let document = ExportDocument {
            category,
            record_count: records.len(),
            records: &records,
        };
        let body = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(&path, body).await.map_err(|e| {
            BackfillError::Process(format!("Failed to write {}: {e}", path.display()))
        })?;

        Ok(ExportedFile {
            category: category.clone(),
            path: Some(path),
            record_count: records.len(),
        })
    }

    fn name(&self) -> &'static str {
        "JsonFileExporter"
    }
}

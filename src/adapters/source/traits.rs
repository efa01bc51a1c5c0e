//! Data source abstraction
//!
//! How records are physically fetched is outside the engine; it only needs
//! these two asynchronous, fallible operations.

use crate::domain::ids::Category;
use crate::domain::window::TimeWindow;
use crate::domain::{Record, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to a category-partitioned record store
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Earliest known record instant for `category`
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` when the source holds no records for the category
    /// or cannot tell; callers then fall back to a fixed epoch.
    async fn earliest_record_instant(&self, category: &Category) -> Result<Option<DateTime<Utc>>>;

    /// Records of `category` starting inside `window`, ordered by start
    ///
    /// # Errors
    ///
    /// Any error is treated as a query failure of the batch.
    async fn fetch_records(&self, category: &Category, window: &TimeWindow) -> Result<Vec<Record>>;
}

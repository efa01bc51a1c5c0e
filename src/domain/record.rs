//! Health record domain model
//!
//! A [`Record`] is one sample returned by a data source for a category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single health metric sample
///
/// # Examples
///
/// ```
/// use backfill::domain::record::Record;
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let record = Record::new(now, now, 72.0).with_unit("count/min");
/// assert_eq!(record.unit.as_deref(), Some("count/min"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// When the sample started
    pub start: DateTime<Utc>,

    /// When the sample ended (equal to `start` for instantaneous samples)
    pub end: DateTime<Utc>,

    /// Numeric value of the sample
    pub value: f64,

    /// Unit of `value`, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Originating device or app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Free-form metadata carried through untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Record {
    /// Creates a record without unit, source or metadata
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, value: f64) -> Self {
        Self {
            start,
            end,
            value,
            unit: None,
            source: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Sets the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the export engine passes around.
//! Each type validates its contents on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Session identifier newtype wrapper
///
/// Identifies one export session and doubles as the key of its persisted
/// descriptor, so it is restricted to characters that are safe in a file name.
///
/// # Examples
///
/// ```
/// use backfill::domain::ids::SessionId;
/// use std::str::FromStr;
///
/// let id = SessionId::from_str("export-1").unwrap();
/// assert_eq!(id.as_str(), "export-1");
///
/// assert!(SessionId::from_str("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new SessionId from a string
    ///
    /// # Arguments
    ///
    /// * `id` - The session identifier string
    ///
    /// # Returns
    ///
    /// Returns `Ok(SessionId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Session ID cannot be empty".to_string());
        }
        if id.len() > 128 {
            return Err(format!("Session ID too long ({} > 128 chars)", id.len()));
        }
        if id.starts_with('.') {
            return Err(format!("Session ID cannot start with '.': {id}"));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(format!(
                "Invalid character '{bad}' in session ID '{id}'. Allowed: A-Z a-z 0-9 - _ ."
            ));
        }
        Ok(Self(id))
    }

    /// Returns the session ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Record category newtype wrapper
///
/// Selects which kind of health record a batch targets (heart rate, step
/// count, ...). Opaque to the engine apart from equality and ordering.
///
/// # Examples
///
/// ```
/// use backfill::domain::ids::Category;
/// use std::str::FromStr;
///
/// let category = Category::from_str("heart_rate").unwrap();
/// assert_eq!(category.to_string(), "heart_rate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Creates a new Category from a string
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Category cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the category as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.0
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

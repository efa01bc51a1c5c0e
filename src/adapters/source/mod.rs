//! Record sources
//!
//! - [`traits`] - the [`DataSource`] interface consumed by sessions
//! - [`jsonl`] - a JSON-lines directory implementation

pub mod jsonl;
pub mod traits;

pub use jsonl::JsonLinesSource;
pub use traits::DataSource;

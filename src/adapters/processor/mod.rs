//! Batch processors
//!
//! - [`traits`] - [`Processor`], [`ResultHandler`] and [`Delivery`]
//! - [`json_file`] - a processor exporting each batch to a JSON file

pub mod json_file;
pub mod traits;

pub use json_file::{ExportedFile, JsonFileExporter};
pub use traits::{Delivery, Processor, ResultHandler};

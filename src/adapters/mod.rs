//! External collaborators of the export engine.
//!
//! - [`source`] - where records come from ([`DataSource`])
//! - [`processor`] - what is done with each batch ([`Processor`], [`ResultHandler`])
//! - [`storage`] - where descriptors are persisted ([`DescriptorStorage`])
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies
//! and enable testing with scripted implementations. Each seam is an
//! `async_trait` trait with one or more concrete implementations here.
//!
//! ```rust,no_run
//! use backfill::adapters::{FileStorage, JsonFileExporter, JsonLinesSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = JsonLinesSource::new("./data");
//! let processor = JsonFileExporter::new("./export");
//! let storage = FileStorage::new("./state").await?;
//! # Ok(())
//! # }
//! ```

pub mod processor;
pub mod source;
pub mod storage;

pub use processor::{Delivery, ExportedFile, JsonFileExporter, Processor, ResultHandler};
pub use source::{DataSource, JsonLinesSource};
pub use storage::{create_state_storage, DescriptorStorage, FileStorage, MemoryStorage};

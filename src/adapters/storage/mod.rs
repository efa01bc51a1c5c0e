//! Descriptor persistence
//!
//! Trait-based abstraction over the store holding one serialized descriptor
//! per session, with in-memory and directory-backed implementations.

pub mod factory;
pub mod file;
pub mod memory;
pub mod traits;

pub use factory::create_state_storage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::DescriptorStorage;

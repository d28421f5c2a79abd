pub mod kv_store;
pub mod json_file;
pub mod memory;

pub use kv_store::{KeyValueStore, StorageError, StorageResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

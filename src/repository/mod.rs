//! Repository Layer
//!
//! Local persistence abstractions and implementations.

mod traits;
mod db;
mod memory;
mod snapshot_repo;


pub use traits::{KeyValueStore, StorageError, StorageResult};
pub use db::{init_db, DbState, SqliteStore};
pub use memory::MemoryStore;
pub use snapshot_repo::SnapshotRepository;

// Service exports
pub mod embedding;
pub mod memory;
pub mod postgres;
pub mod run_lock;
pub mod store;

pub use embedding::{CachedEmbedder, HttpEmbedder};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use run_lock::{RunLock, RunLockError, RunLockGuard};
pub use store::{EngagementStore, ProfileStore, StoreError};

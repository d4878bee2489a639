//! Record storage
//!
//! Readings, current changes, feeding schedules and health checks are
//! persisted through the [`TankRepository`] trait. The backend is picked
//! from the `[storage]` config table.

pub mod persistence;
pub mod sled_backend;

pub use persistence::{InMemoryRepository, PersistenceError, TankRepository};
pub use sled_backend::SledRepository;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Open the repository selected by `config`.
pub fn open_repository(config: &StorageConfig) -> Result<Arc<dyn TankRepository>, PersistenceError> {
    let repo: Arc<dyn TankRepository> = match config.backend {
        StorageBackend::Sled => Arc::new(SledRepository::open(&config.path)?),
        StorageBackend::Memory => Arc::new(InMemoryRepository::new()),
    };
    tracing::info!(backend = repo.backend_name(), "Storage backend ready");
    Ok(repo)
}

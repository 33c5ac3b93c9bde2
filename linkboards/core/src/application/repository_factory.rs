// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates the concrete board and link stores for the configured storage
//! backend, keeping the domain layer free of infrastructure dependencies.

use std::sync::Arc;
use tracing::info;

use crate::domain::repository::{BoardAggregateStore, LinkStore, RepositoryError, StorageBackend};
use crate::infrastructure::repositories::{InMemoryBoardStore, InMemoryLinkStore, SledBoardStore};

/// The stores backing one process. Both live in the same sled database when
/// the backend is persistent.
#[derive(Clone)]
pub struct Stores {
    pub boards: Arc<dyn BoardAggregateStore>,
    pub links: Arc<dyn LinkStore>,
}

/// Creates the store implementations for the configured backend
pub fn create_stores(backend: &StorageBackend) -> Result<Stores, RepositoryError> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory board and link stores");
            Ok(Stores {
                boards: Arc::new(InMemoryBoardStore::new()),
                links: Arc::new(InMemoryLinkStore::new()),
            })
        }
        StorageBackend::Sled(config) => {
            info!("Opening sled stores at {:?}", config.path);
            let boards = SledBoardStore::open(&config.path)?;
            let links = boards.link_store()?;
            Ok(Stores {
                boards: Arc::new(boards),
                links: Arc::new(links),
            })
        }
    }
}

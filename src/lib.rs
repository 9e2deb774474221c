//! Catalog Tags
//!
//! Tag management for catalog items.
//!
//! Layered architecture:
//! - domain: Core entities and errors
//! - repository: Storage abstractions and SQLite implementations
//! - cache: In-process cache with region invalidation
//! - service: Tag assignment, counts and listings

use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod domain;
pub mod repository;
pub mod service;

pub use config::CatalogSettings;
pub use domain::{DomainError, DomainResult};

use cache::MemoryCache;
use repository::{init_db, DbState};
use service::{TagAssignmentManager, TagServiceDeps, WorkContext};

/// Application state: database, cache and the tag service built on them.
///
/// The cache lives as long as this state; every region handed out is
/// invalidated through it.
pub struct AppState {
    pub db_state: DbState,
    pub cache: Arc<MemoryCache>,
    pub tags: TagAssignmentManager,
    pub settings: CatalogSettings,
}

impl AppState {
    /// Open the database named in `settings` and wire the tag service
    pub async fn init(settings: CatalogSettings, context: Arc<dyn WorkContext>) -> DomainResult<Self> {
        let db_path = settings.database_path();
        let db_state = init_db(&db_path).await?;
        log::info!("catalog database opened at {}", db_path.display());

        let cache = MemoryCache::new(settings.cache_ttl());
        let tags = TagAssignmentManager::new(
            TagServiceDeps::sqlite(&db_state),
            &cache,
            context,
            settings.clone(),
        );

        Ok(Self {
            db_state,
            cache,
            tags,
            settings,
        })
    }
}

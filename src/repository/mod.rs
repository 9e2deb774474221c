//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod traits;
mod db;
mod item_repo;
mod visibility_repo;
mod slug_repo;
pub mod tag;

#[cfg(test)]
mod tests;

pub use traits::{
    ItemQuery, ItemStore, MappingStore, Repository, SlugService, SlugTarget, TagStore,
    VisibilityFilter,
};
pub use db::{init_db, DbState, SharedConnection};
pub use item_repo::ItemRepository;
pub use tag::TagRepository;
pub use visibility_repo::VisibilityRepository;
pub use slug_repo::{slugify, SlugRepository, MAX_SLUG_LENGTH};

//! Tag Repository Module
//!
//! Tag repository functionality split into specialized sub-modules:
//! - tag_repo: Core CRUD operations and name lookups
//! - item_tag: Item-Tag relationship operations

mod tag_repo;
mod item_tag;

pub use tag_repo::TagRepository;

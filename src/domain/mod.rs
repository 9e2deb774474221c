//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO storage dependencies (only serde and thiserror).

mod entity;
mod item;
mod tag;
mod url_record;

pub use entity::{Entity, EntityKind, DomainError, DomainResult};
pub use item::Item;
pub use tag::{Tag, ItemTag, name_key};
pub use url_record::UrlRecord;

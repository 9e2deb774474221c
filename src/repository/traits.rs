//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces the tag service depends on.
//! Implementations can use SQLite, in-memory, etc.

use std::collections::HashSet;

use async_trait::async_trait;
use crate::domain::{Entity, EntityKind, DomainResult, Item, ItemTag, Tag};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity, returning it with its assigned ID
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Update an existing entity. Fails with `NotFound` if it does not exist.
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID. Fails with `NotFound` if it does not exist.
    async fn delete(&self, id: T::Id) -> DomainResult<()>;
}

/// Predicate for item queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Restrict to these ids
    pub ids: Option<Vec<u32>>,
    /// Only published items
    pub published_only: bool,
    /// Include soft-deleted items
    pub include_deleted: bool,
}

impl ItemQuery {
    /// Items a storefront may show: published and not deleted
    pub fn visible() -> Self {
        Self {
            ids: None,
            published_only: true,
            include_deleted: false,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&item.id) {
                return false;
            }
        }
        (!self.published_only || item.published) && (self.include_deleted || !item.deleted)
    }
}

/// Item storage
#[async_trait]
pub trait ItemStore: Repository<Item> {
    /// Query items by predicate
    async fn query(&self, query: &ItemQuery) -> DomainResult<Vec<Item>>;
}

/// Tag storage
#[async_trait]
pub trait TagStore: Repository<Tag> {
    /// Fetch several tags; ids with no row are skipped
    async fn find_by_ids(&self, ids: &[u32]) -> DomainResult<Vec<Tag>>;

    /// Case-insensitive lookup by name
    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tag>>;

    /// Insert a tag with this name unless one already exists, then return it
    async fn get_or_create(&self, name: &str) -> DomainResult<Tag>;

    /// Tags mapped to an item, ordered by tag id
    async fn list_for_item(&self, item_id: u32) -> DomainResult<Vec<Tag>>;
}

/// Item-tag link storage
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Look up a mapping by its (item, tag) pair
    async fn find_mapping(&self, item_id: u32, tag_id: u32) -> DomainResult<Option<ItemTag>>;

    /// Insert a mapping; inserting an existing pair is a no-op
    async fn insert_mapping(&self, mapping: ItemTag) -> DomainResult<()>;

    /// Delete a mapping. Fails with `NotFound` if it does not exist.
    async fn delete_mapping(&self, mapping: ItemTag) -> DomainResult<()>;

    /// All mappings
    async fn list_mappings(&self) -> DomainResult<Vec<ItemTag>>;
}

/// Store-mapping and ACL data for visibility scoping
#[async_trait]
pub trait VisibilityFilter: Send + Sync {
    /// Whether any store-mapping rows exist for this entity type
    async fn has_store_mappings(&self, kind: EntityKind) -> DomainResult<bool>;

    /// Whether any ACL rows exist for this entity type
    async fn has_acl_records(&self, kind: EntityKind) -> DomainResult<bool>;

    /// Ids of entities mapped to the store
    async fn store_mapped_ids(&self, kind: EntityKind, store_id: u32) -> DomainResult<HashSet<u32>>;

    /// Ids of entities granted to any of the roles
    async fn acl_granted_ids(&self, kind: EntityKind, role_ids: &[u32]) -> DomainResult<HashSet<u32>>;
}

/// Entity a slug belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlugTarget {
    pub kind: EntityKind,
    pub id: u32,
}

impl SlugTarget {
    pub fn of<E: Entity<Id = u32>>(entity: &E) -> Self {
        Self {
            kind: E::KIND,
            id: entity.id(),
        }
    }
}

/// URL slug generation and persistence
#[async_trait]
pub trait SlugService: Send + Sync {
    /// Derive a slug for `target` from `current_slug`, falling back to
    /// `desired_name` when the current slug is empty
    async fn validate_name(
        &self,
        target: SlugTarget,
        current_slug: &str,
        desired_name: &str,
        ensure_unique: bool,
    ) -> DomainResult<String>;

    /// Make `slug` the active slug of `target` for the language
    async fn save_slug(&self, target: SlugTarget, slug: &str, language_id: u32) -> DomainResult<()>;

    /// Currently active slug of `target`, if any
    async fn active_slug(&self, target: SlugTarget, language_id: u32) -> DomainResult<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_query_filters_state() {
        let query = ItemQuery::visible();
        let mut item = Item::new(1, "Lamp".to_string());
        assert!(query.matches(&item));

        item.deleted = true;
        assert!(!query.matches(&item));

        item.deleted = false;
        item.published = false;
        assert!(!query.matches(&item));
    }

    #[test]
    fn test_query_by_ids() {
        let query = ItemQuery {
            ids: Some(vec![2, 3]),
            ..ItemQuery::default()
        };
        assert!(!query.matches(&Item::new(1, "a".to_string())));
        assert!(query.matches(&Item::new(2, "b".to_string())));
    }

    #[test]
    fn test_slug_target_of_tag() {
        let target = SlugTarget::of(&Tag::new(7, "Red".to_string()));
        assert_eq!(target.kind, EntityKind::Tag);
        assert_eq!(target.id, 7);
    }
}

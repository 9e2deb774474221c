//! Tag Assignment Service
//!
//! Keeps the item/tag relation in line with the tag names callers want on
//! an item, serves cached tag lists and per-store item counts, and
//! invalidates the tag cache region on every change.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cache::{CacheRegion, MemoryCache};
use crate::config::CatalogSettings;
use crate::domain::{DomainError, DomainResult, EntityKind, Item, ItemTag, Tag};
use crate::repository::{
    DbState, ItemQuery, ItemRepository, ItemStore, MappingStore, SlugRepository,
    SlugService, SlugTarget, TagRepository, TagStore, VisibilityFilter, VisibilityRepository,
};
use super::context::WorkContext;
use super::tag_counts::count_items_per_tag;
use super::visibility::VisibilityPredicate;

/// Cache region holding every tag list and count
pub const TAG_CACHE_REGION: &str = "tag";

/// Language the tag slugs are saved under
const DEFAULT_LANGUAGE_ID: u32 = 0;

/// Storage collaborators of the tag service
#[derive(Clone)]
pub struct TagServiceDeps {
    pub items: Arc<dyn ItemStore>,
    pub tags: Arc<dyn TagStore>,
    pub mappings: Arc<dyn MappingStore>,
    pub visibility: Arc<dyn VisibilityFilter>,
    pub slugs: Arc<dyn SlugService>,
}

impl TagServiceDeps {
    /// SQLite stores sharing one connection
    pub fn sqlite(db: &DbState) -> Self {
        let tags = Arc::new(TagRepository::new(db.handle()));
        Self {
            items: Arc::new(ItemRepository::new(db.handle())),
            tags: tags.clone(),
            mappings: tags,
            visibility: Arc::new(VisibilityRepository::new(db.handle())),
            slugs: Arc::new(SlugRepository::new(db.handle())),
        }
    }
}

pub struct TagAssignmentManager {
    items: Arc<dyn ItemStore>,
    tags: Arc<dyn TagStore>,
    mappings: Arc<dyn MappingStore>,
    visibility: Arc<dyn VisibilityFilter>,
    slugs: Arc<dyn SlugService>,
    context: Arc<dyn WorkContext>,
    cache: CacheRegion,
    settings: CatalogSettings,
}

impl TagAssignmentManager {
    pub fn new(
        deps: TagServiceDeps,
        cache: &Arc<MemoryCache>,
        context: Arc<dyn WorkContext>,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            items: deps.items,
            tags: deps.tags,
            mappings: deps.mappings,
            visibility: deps.visibility,
            slugs: deps.slugs,
            context,
            cache: cache.region(TAG_CACHE_REGION),
            settings,
        }
    }

    // ========================
    // Reconciliation
    // ========================

    /// Make `desired_names` the complete tag set of `item`.
    ///
    /// Names compare case-insensitively; blank names are skipped. Tags that
    /// lose their last item stay in place. There is no rollback: on error
    /// the steps already taken remain applied.
    pub async fn reconcile_tags<S>(&self, item: &Item, desired_names: &[S]) -> DomainResult<()>
    where
        S: AsRef<str> + Sync,
    {
        if !item.is_persisted() {
            return Err(DomainError::invalid_input("item must be saved before it can be tagged"));
        }

        let names: Vec<&str> = desired_names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .collect();

        let result = self.apply_tag_names(item.id, &names).await;
        // Partial changes must not be served from cache either
        self.cache.invalidate();
        result
    }

    async fn apply_tag_names(&self, item_id: u32, names: &[&str]) -> DomainResult<()> {
        let current = self.tags.list_for_item(item_id).await?;

        let to_remove: Vec<&Tag> = current
            .iter()
            .filter(|tag| !names.iter().any(|name| tag.matches_name(name)))
            .collect();
        for tag in to_remove {
            log::debug!("item {}: removing tag {} '{}'", item_id, tag.id, tag.name);
            self.unmap(item_id, tag.id).await?;
        }

        for name in names {
            let tag = self.tags.get_or_create(name).await?;

            if self.mappings.find_mapping(item_id, tag.id).await?.is_none() {
                log::debug!("item {}: adding tag {} '{}'", item_id, tag.id, tag.name);
                self.mappings
                    .insert_mapping(ItemTag { item_id, tag_id: tag.id })
                    .await?;
            }

            self.refresh_slug(&tag).await?;
        }

        Ok(())
    }

    async fn unmap(&self, item_id: u32, tag_id: u32) -> DomainResult<()> {
        let result = self.mappings.delete_mapping(ItemTag { item_id, tag_id }).await;
        if let Err(DomainError::NotFound(_)) = &result {
            log::warn!("mapping item {} / tag {} vanished before removal", item_id, tag_id);
        }
        result
    }

    async fn refresh_slug(&self, tag: &Tag) -> DomainResult<()> {
        let target = SlugTarget::of(tag);
        let slug = self.slugs.validate_name(target, "", &tag.name, true).await?;
        self.slugs.save_slug(target, &slug, DEFAULT_LANGUAGE_ID).await
    }

    // ========================
    // Counts
    // ========================

    /// Number of items per tag id in `store_id`.
    ///
    /// With `show_hidden` every mapping counts. Without it only published,
    /// non-deleted items visible in the store to the current roles count.
    /// Tags nobody uses map to 0.
    pub async fn tag_counts(&self, store_id: u32, show_hidden: bool) -> DomainResult<HashMap<u32, u32>> {
        let mut role_ids = self.context.current_role_ids().await?;
        role_ids.sort_unstable();
        role_ids.dedup();

        // Managers with different settings may share one cache
        let key = format!(
            "count.{}-{}-{}-{}-{}",
            store_id,
            role_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","),
            show_hidden,
            self.settings.ignore_store_limitations,
            self.settings.ignore_acl
        );

        let roles = &role_ids;
        self.cache
            .get_or_try_insert(key, move || self.compute_tag_counts(store_id, roles, show_hidden))
            .await
    }

    async fn compute_tag_counts(
        &self,
        store_id: u32,
        role_ids: &[u32],
        show_hidden: bool,
    ) -> DomainResult<HashMap<u32, u32>> {
        let tags = self.tags.list().await?;
        let mappings = self.mappings.list_mappings().await?;

        let counted = if show_hidden {
            None
        } else {
            let predicate = VisibilityPredicate::build(
                self.visibility.as_ref(),
                &self.settings,
                EntityKind::Item,
                store_id,
                role_ids,
            )
            .await?;
            let items = self.items.query(&ItemQuery::visible()).await?;
            Some(
                items
                    .iter()
                    .filter(|item| predicate.allows(item))
                    .map(|item| item.id)
                    .collect::<HashSet<u32>>(),
            )
        };

        Ok(count_items_per_tag(&tags, &mappings, counted.as_ref()))
    }

    /// Item count of one tag; 0 for tags that don't exist
    pub async fn item_count(&self, tag_id: u32, store_id: u32, show_hidden: bool) -> DomainResult<u32> {
        let counts = self.tag_counts(store_id, show_hidden).await?;
        Ok(counts.get(&tag_id).copied().unwrap_or(0))
    }

    // ========================
    // Queries
    // ========================

    /// All tags ordered by name, optionally narrowed to names containing
    /// `name_filter` (case-sensitive). Only the unfiltered list is cached.
    pub async fn list_tags(&self, name_filter: Option<&str>) -> DomainResult<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .cache
            .get_or_try_insert("all", move || self.tags.list())
            .await?;

        if let Some(filter) = name_filter.filter(|f| !f.is_empty()) {
            tags.retain(|tag| tag.name.contains(filter));
        }
        Ok(tags)
    }

    /// Tags of an item, ordered by tag id
    pub async fn list_tags_for_item(&self, item_id: u32) -> DomainResult<Vec<Tag>> {
        self.cache
            .get_or_try_insert(format!("by-item.{}", item_id), move || {
                self.tags.list_for_item(item_id)
            })
            .await
    }

    pub async fn get_tag(&self, tag_id: u32) -> DomainResult<Option<Tag>> {
        self.tags.find_by_id(tag_id).await
    }

    /// Tags for the given ids in request order; unknown ids are skipped
    pub async fn get_tags_by_ids(&self, tag_ids: &[u32]) -> DomainResult<Vec<Tag>> {
        self.tags.find_by_ids(tag_ids).await
    }

    /// Case-insensitive lookup
    pub async fn get_tag_by_name(&self, name: &str) -> DomainResult<Option<Tag>> {
        self.tags.find_by_name(name).await
    }

    pub async fn item_has_tag(&self, item_id: u32, tag_id: u32) -> DomainResult<bool> {
        Ok(self.mappings.find_mapping(item_id, tag_id).await?.is_some())
    }

    /// Active slug of a tag
    pub async fn tag_slug(&self, tag_id: u32) -> DomainResult<Option<String>> {
        let target = SlugTarget { kind: EntityKind::Tag, id: tag_id };
        self.slugs.active_slug(target, DEFAULT_LANGUAGE_ID).await
    }

    // ========================
    // Mutations
    // ========================

    pub async fn insert_tag(&self, name: &str) -> DomainResult<Tag> {
        let name = require_name(name)?;
        let tag = self.tags.create(&Tag::new(0, name.to_string())).await?;
        self.cache.invalidate();
        Ok(tag)
    }

    /// Rename a tag and regenerate its slug
    pub async fn update_tag(&self, tag: &Tag) -> DomainResult<Tag> {
        let name = require_name(&tag.name)?;
        let updated = self.tags.update(&Tag::new(tag.id, name.to_string())).await?;
        self.cache.invalidate();

        self.refresh_slug(&updated).await?;
        Ok(updated)
    }

    /// Delete a tag together with its item mappings
    pub async fn delete_tag(&self, tag: &Tag) -> DomainResult<()> {
        self.tags.delete(tag.id).await?;
        self.cache.invalidate();
        Ok(())
    }

    /// Delete tags one by one; stops at the first failure, keeping earlier deletions
    pub async fn delete_tags(&self, tags: &[Tag]) -> DomainResult<()> {
        for tag in tags {
            self.delete_tag(tag).await?;
        }
        Ok(())
    }

    pub async fn insert_mapping(&self, item_id: u32, tag_id: u32) -> DomainResult<()> {
        self.mappings.insert_mapping(ItemTag { item_id, tag_id }).await?;
        self.cache.invalidate();
        Ok(())
    }

    pub async fn delete_mapping(&self, item_id: u32, tag_id: u32) -> DomainResult<()> {
        self.unmap(item_id, tag_id).await?;
        self.cache.invalidate();
        Ok(())
    }
}

fn require_name(name: &str) -> DomainResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::invalid_input("tag name must not be empty"));
    }
    Ok(name)
}

//! Visibility Predicate
//!
//! Decides whether an item is visible in a store to a set of roles.
//! Built once per count computation from the visibility filter's rows.

use std::collections::HashSet;

use crate::config::CatalogSettings;
use crate::domain::{DomainResult, EntityKind, Item};
use crate::repository::VisibilityFilter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityPredicate {
    /// Entities mapped to the store; `None` when store limits don't apply
    store_ids: Option<HashSet<u32>>,
    /// Entities granted to the roles; `None` when ACL doesn't apply
    acl_ids: Option<HashSet<u32>>,
}

impl VisibilityPredicate {
    /// Predicate that accepts everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build the predicate for `store_id` and `role_ids`.
    ///
    /// Each check is skipped when its setting says to ignore it or when no
    /// rows of that kind exist for the entity type, so the id sets are only
    /// fetched when they can exclude something. Store 0 means "all stores".
    pub async fn build(
        filter: &dyn VisibilityFilter,
        settings: &CatalogSettings,
        kind: EntityKind,
        store_id: u32,
        role_ids: &[u32],
    ) -> DomainResult<Self> {
        let store_ids = if store_id == 0
            || settings.ignore_store_limitations
            || !filter.has_store_mappings(kind).await?
        {
            None
        } else {
            Some(filter.store_mapped_ids(kind, store_id).await?)
        };

        let acl_ids = if settings.ignore_acl || !filter.has_acl_records(kind).await? {
            None
        } else {
            Some(filter.acl_granted_ids(kind, role_ids).await?)
        };

        Ok(Self { store_ids, acl_ids })
    }

    pub fn allows(&self, item: &Item) -> bool {
        if let Some(ids) = &self.store_ids {
            if item.limited_to_stores && !ids.contains(&item.id) {
                return false;
            }
        }
        if let Some(ids) = &self.acl_ids {
            if item.subject_to_acl && !ids.contains(&item.id) {
                return false;
            }
        }
        true
    }
}

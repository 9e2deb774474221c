//! Item Entity
//!
//! A catalog item that tags are attached to. Items are owned by the item
//! store; the tag service only reads their visibility state.

use serde::{Deserialize, Serialize};
use super::entity::{Entity, EntityKind};

/// A catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier (0 = not yet persisted)
    pub id: u32,
    /// Display name
    pub name: String,
    /// Visible in the storefront
    pub published: bool,
    /// Soft-deleted
    pub deleted: bool,
    /// Only visible in stores it is explicitly mapped to
    pub limited_to_stores: bool,
    /// Only visible to roles it is explicitly granted to
    pub subject_to_acl: bool,
}

impl Item {
    /// Create a new published, unrestricted item
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            published: true,
            deleted: false,
            limited_to_stores: false,
            subject_to_acl: false,
        }
    }

    /// Create an unpublished draft
    pub fn draft(id: u32, name: String) -> Self {
        Self {
            published: false,
            ..Self::new(id, name)
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

impl Entity for Item {
    type Id = u32;
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> Self::Id {
        self.id
    }
}

//! Tag Entity
//!
//! Tags can be attached to items for search, filtering and navigation.

use serde::{Deserialize, Serialize};
use super::entity::{Entity, EntityKind};

/// A tag for labelling items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: u32,
    /// Tag name
    pub name: String,
    /// Last write, unix millis; unset until stored
    pub updated_at: Option<i64>,
}

impl Tag {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            updated_at: None,
        }
    }

    /// Case-insensitive name comparison used by reconciliation
    pub fn matches_name(&self, name: &str) -> bool {
        name_key(&self.name) == name_key(name)
    }
}

impl Entity for Tag {
    type Id = u32;
    const KIND: EntityKind = EntityKind::Tag;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Normalized form of a tag name; unique across all tags.
///
/// Lowercasing is locale-independent so the same key comes out
/// regardless of where the service runs.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Join table entry for item-tag relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemTag {
    pub item_id: u32,
    pub tag_id: u32,
}

//! URL Record Entity
//!
//! Slug history for sluggable entities. At most one record per
//! (entity, language) is active at a time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: u32,
    pub entity_name: String,
    pub entity_id: u32,
    pub slug: String,
    pub is_active: bool,
    pub language_id: u32,
}

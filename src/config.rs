//! Catalog Settings
//!
//! Platform switches consulted by the tag service, loaded from JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Skip store-mapping checks when counting items
    pub ignore_store_limitations: bool,
    /// Skip ACL checks when counting items
    pub ignore_acl: bool,
    /// Lifetime of cached tag data
    pub cache_ttl_secs: u64,
    /// SQLite file; in-memory when unset
    pub database_path: Option<PathBuf>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            ignore_store_limitations: false,
            ignore_acl: false,
            cache_ttl_secs: 3600,
            database_path: None,
        }
    }
}

impl CatalogSettings {
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        serde_json::from_str(json).map_err(|e| DomainError::Config(e.to_string()))
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Database location for `init_db`
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(":memory:"))
    }
}

//! Visibility Repository
//!
//! Store-mapping and ACL rows used to scope which entities a store or a
//! set of roles may see. Rows are keyed by entity name so any entity type
//! can be restricted.

use std::collections::HashSet;

use async_trait::async_trait;
use rusqlite::{params, params_from_iter};

use crate::domain::{DomainResult, EntityKind};
use super::db::{connection, SharedConnection};
use super::traits::VisibilityFilter;

/// SQLite implementation of the visibility filter
pub struct VisibilityRepository {
    conn: SharedConnection,
}

impl VisibilityRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Make an entity visible in a store
    pub async fn map_to_store(&self, kind: EntityKind, entity_id: u32, store_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        conn.execute(
            "INSERT OR IGNORE INTO store_mappings (entity_name, entity_id, store_id) VALUES (?, ?, ?)",
            params![kind.as_str(), entity_id, store_id],
        )?;
        Ok(())
    }

    /// Grant a role access to an entity
    pub async fn grant_role(&self, kind: EntityKind, entity_id: u32, role_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        conn.execute(
            "INSERT OR IGNORE INTO acl_records (entity_name, entity_id, role_id) VALUES (?, ?, ?)",
            params![kind.as_str(), entity_id, role_id],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VisibilityFilter for VisibilityRepository {
    async fn has_store_mappings(&self, kind: EntityKind) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM store_mappings WHERE entity_name = ?)",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn has_acl_records(&self, kind: EntityKind) -> DomainResult<bool> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM acl_records WHERE entity_name = ?)",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn store_mapped_ids(&self, kind: EntityKind, store_id: u32) -> DomainResult<HashSet<u32>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut stmt = conn.prepare(
            "SELECT entity_id FROM store_mappings WHERE entity_name = ? AND store_id = ?",
        )?;
        let rows = stmt.query_map(params![kind.as_str(), store_id], |row| row.get::<_, u32>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    async fn acl_granted_ids(&self, kind: EntityKind, role_ids: &[u32]) -> DomainResult<HashSet<u32>> {
        if role_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let placeholders = vec!["?"; role_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT entity_id FROM acl_records WHERE entity_name = ? AND role_id IN ({})",
            placeholders
        ))?;

        let mut values: Vec<rusqlite::types::Value> = vec![kind.as_str().to_string().into()];
        values.extend(role_ids.iter().map(|id| rusqlite::types::Value::from(*id)));
        let rows = stmt.query_map(params_from_iter(values), |row| row.get::<_, u32>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }
}

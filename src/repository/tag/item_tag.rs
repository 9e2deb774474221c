//! Item-Tag Relationship Operations
//!
//! The many-to-many relationship between items and tags.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::domain::{DomainError, DomainResult, ItemTag};
use crate::repository::db::connection;
use crate::repository::traits::MappingStore;

#[async_trait]
impl MappingStore for super::tag_repo::TagRepository {
    async fn find_mapping(&self, item_id: u32, tag_id: u32) -> DomainResult<Option<ItemTag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mapping = conn
            .query_row(
                "SELECT item_id, tag_id FROM item_tags WHERE item_id = ? AND tag_id = ?",
                params![item_id, tag_id],
                row_to_mapping,
            )
            .optional()?;
        Ok(mapping)
    }

    async fn insert_mapping(&self, mapping: ItemTag) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag_id) VALUES (?, ?)",
            params![mapping.item_id, mapping.tag_id],
        )?;

        Ok(())
    }

    async fn delete_mapping(&self, mapping: ItemTag) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let changed = conn.execute(
            "DELETE FROM item_tags WHERE item_id = ? AND tag_id = ?",
            params![mapping.item_id, mapping.tag_id],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found(format!(
                "mapping item {} / tag {}",
                mapping.item_id, mapping.tag_id
            )));
        }

        Ok(())
    }

    async fn list_mappings(&self) -> DomainResult<Vec<ItemTag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut stmt = conn.prepare("SELECT item_id, tag_id FROM item_tags ORDER BY tag_id, item_id")?;
        let rows = stmt.query_map([], row_to_mapping)?;

        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?);
        }
        Ok(mappings)
    }
}

fn row_to_mapping(row: &rusqlite::Row) -> rusqlite::Result<ItemTag> {
    Ok(ItemTag {
        item_id: row.get(0)?,
        tag_id: row.get(1)?,
    })
}

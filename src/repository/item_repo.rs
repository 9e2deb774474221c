//! Item Repository Implementation
//!
//! SQLite-backed implementation for Item CRUD and predicate queries.
//! Deleting an item is a soft delete; the row stays with `deleted = 1`.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::domain::{DomainError, DomainResult, Item};
use super::db::{connection, last_insert_id, SharedConnection};
use super::traits::{ItemQuery, ItemStore, Repository};

const ITEM_COLUMNS: &str = "id, name, published, deleted, limited_to_stores, subject_to_acl";

/// SQLite implementation of Item repository
pub struct ItemRepository {
    conn: SharedConnection,
}

impl ItemRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Item> for ItemRepository {
    async fn create(&self, entity: &Item) -> DomainResult<Item> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        conn.execute(
            "INSERT INTO items (name, published, deleted, limited_to_stores, subject_to_acl)
             VALUES (?, ?, ?, ?, ?)",
            params![
                entity.name,
                entity.published,
                entity.deleted,
                entity.limited_to_stores,
                entity.subject_to_acl
            ],
        )?;

        let mut item = entity.clone();
        item.id = last_insert_id(conn)?;
        Ok(item)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Item>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let item = conn
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS),
                params![id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        self.query(&ItemQuery::default()).await
    }

    async fn update(&self, entity: &Item) -> DomainResult<Item> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let changed = conn.execute(
            "UPDATE items SET name = ?, published = ?, deleted = ?, limited_to_stores = ?, subject_to_acl = ?
             WHERE id = ?",
            params![
                entity.name,
                entity.published,
                entity.deleted,
                entity.limited_to_stores,
                entity.subject_to_acl,
                entity.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found(format!("item {}", entity.id)));
        }

        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        // Soft delete: mappings stay, counts filter on the flag
        let changed = conn.execute("UPDATE items SET deleted = 1 WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found(format!("item {}", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn query(&self, query: &ItemQuery) -> DomainResult<Vec<Item>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut sql = format!("SELECT {} FROM items WHERE 1 = 1", ITEM_COLUMNS);
        if query.published_only {
            sql.push_str(" AND published = 1");
        }
        if !query.include_deleted {
            sql.push_str(" AND deleted = 0");
        }
        let ids = query.ids.clone().unwrap_or_default();
        if query.ids.is_some() {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; ids.len()].join(", ");
            sql.push_str(&format!(" AND id IN ({})", placeholders));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

/// Convert a database row to Item
fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        published: row.get(2)?,
        deleted: row.get(3)?,
        limited_to_stores: row.get(4)?,
        subject_to_acl: row.get(5)?,
    })
}

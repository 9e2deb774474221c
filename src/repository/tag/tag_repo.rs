//! Tag Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Tag CRUD.
//! Item-Tag relationships are in `item_tag`.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, ErrorCode, OptionalExtension};

use crate::domain::{name_key, DomainError, DomainResult, Tag};
use crate::repository::db::{connection, last_insert_id, SharedConnection};
use crate::repository::traits::{Repository, TagStore};

/// SQLite implementation of Tag repository
pub struct TagRepository {
    pub(super) conn: SharedConnection,
}

impl TagRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Repository<Tag> for TagRepository {
    async fn create(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let name = entity.name.trim();
        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO tags (name, name_key, updated_at) VALUES (?, ?, ?)",
            params![name, name_key(name), now],
        )
        .map_err(|e| name_conflict(e, name))?;

        let tag = Tag {
            id: last_insert_id(conn)?,
            name: name.to_string(),
            updated_at: Some(now),
        };
        log::info!("created tag {} '{}'", tag.id, tag.name);
        Ok(tag)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let tag = conn
            .query_row(
                "SELECT id, name, updated_at FROM tags WHERE id = ?",
                params![id],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut stmt = conn.prepare("SELECT id, name, updated_at FROM tags ORDER BY name, id")?;
        let rows = stmt.query_map([], row_to_tag)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    async fn update(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let name = entity.name.trim();
        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn
            .execute(
                "UPDATE tags SET name = ?, name_key = ?, updated_at = ? WHERE id = ?",
                params![name, name_key(name), now, entity.id],
            )
            .map_err(|e| name_conflict(e, name))?;
        if changed == 0 {
            return Err(DomainError::not_found(format!("tag {}", entity.id)));
        }

        Ok(Tag {
            id: entity.id,
            name: name.to_string(),
            updated_at: Some(now),
        })
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        // CASCADE removes item_tags entries
        let changed = conn.execute("DELETE FROM tags WHERE id = ?", params![id])?;
        if changed == 0 {
            return Err(DomainError::not_found(format!("tag {}", id)));
        }

        log::info!("deleted tag {}", id);
        Ok(())
    }
}

#[async_trait]
impl TagStore for TagRepository {
    async fn find_by_ids(&self, ids: &[u32]) -> DomainResult<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, updated_at FROM tags WHERE id IN ({})",
            placeholders
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), row_to_tag)?;

        let mut found = Vec::new();
        for row in rows {
            found.push(row?);
        }

        // Keep the caller's order; duplicates in `ids` yield duplicates
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|t| t.id == *id).cloned())
            .collect())
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let tag = conn
            .query_row(
                "SELECT id, name, updated_at FROM tags WHERE name_key = ?",
                params![name_key(name)],
                row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    async fn get_or_create(&self, name: &str) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let key = name_key(name);
        let inserted = conn.execute(
            "INSERT INTO tags (name, name_key, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name_key) DO NOTHING",
            params![name.trim(), key, chrono::Utc::now().timestamp_millis()],
        )?;

        let tag = conn.query_row(
            "SELECT id, name, updated_at FROM tags WHERE name_key = ?",
            params![key],
            row_to_tag,
        )?;
        if inserted > 0 {
            log::info!("created tag {} '{}'", tag.id, tag.name);
        }
        Ok(tag)
    }

    async fn list_for_item(&self, item_id: u32) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.updated_at FROM tags t
             JOIN item_tags it ON t.id = it.tag_id
             WHERE it.item_id = ?
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![item_id], row_to_tag)?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }
}

/// Convert a database row to Tag
pub(super) fn row_to_tag(row: &rusqlite::Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

/// Map a UNIQUE violation on `name_key` to a conflict
fn name_conflict(e: rusqlite::Error, name: &str) -> DomainError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            DomainError::Conflict(format!("tag '{}' already exists", name))
        }
        other => other.into(),
    }
}

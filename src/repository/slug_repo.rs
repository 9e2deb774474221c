//! Slug Repository
//!
//! Generates URL slugs and keeps their history in `url_records`.
//! Previous slugs stay as inactive records so old links can be resolved.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use rusqlite::{params, OptionalExtension};

use crate::domain::{DomainResult, UrlRecord};
use super::db::{connection, SharedConnection};
use super::traits::{SlugService, SlugTarget};

/// Longest slug we store
pub const MAX_SLUG_LENGTH: usize = 200;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid slug regex"));

/// Turn a display name into a URL-safe slug
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dashed = NON_ALPHANUMERIC.replace_all(&lowered, "-");
    let trimmed: String = dashed.trim_matches('-').chars().take(MAX_SLUG_LENGTH).collect();
    trimmed.trim_end_matches('-').to_string()
}

/// `base` with a numeric suffix, cut so the result stays within `MAX_SLUG_LENGTH`
fn with_suffix(base: &str, suffix: u32) -> String {
    let tail = format!("-{}", suffix);
    let head: String = base.chars().take(MAX_SLUG_LENGTH - tail.len()).collect();
    format!("{}{}", head.trim_end_matches('-'), tail)
}

/// SQLite implementation of the slug service
pub struct SlugRepository {
    conn: SharedConnection,
}

impl SlugRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// All records of an entity, newest first
    pub async fn history(&self, target: SlugTarget) -> DomainResult<Vec<UrlRecord>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let mut stmt = conn.prepare(
            "SELECT id, entity_name, entity_id, slug, is_active, language_id FROM url_records
             WHERE entity_name = ? AND entity_id = ?
             ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![target.kind.as_str(), target.id], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[async_trait]
impl SlugService for SlugRepository {
    async fn validate_name(
        &self,
        target: SlugTarget,
        current_slug: &str,
        desired_name: &str,
        ensure_unique: bool,
    ) -> DomainResult<String> {
        let source = if current_slug.trim().is_empty() {
            desired_name
        } else {
            current_slug
        };

        let mut slug = slugify(source);
        if slug.is_empty() {
            slug = target.id.to_string();
        }
        if !ensure_unique {
            return Ok(slug);
        }

        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let base = slug.clone();
        let mut suffix = 2;
        loop {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM url_records
                 WHERE slug = ? AND NOT (entity_name = ? AND entity_id = ?))",
                params![slug, target.kind.as_str(), target.id],
                |row| row.get(0),
            )?;
            if !taken {
                break;
            }
            slug = with_suffix(&base, suffix);
            suffix += 1;
        }

        Ok(slug)
    }

    async fn save_slug(&self, target: SlugTarget, slug: &str, language_id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;
        let tx = conn.unchecked_transaction()?;

        let active: Option<(u32, String)> = tx
            .query_row(
                "SELECT id, slug FROM url_records
                 WHERE entity_name = ? AND entity_id = ? AND language_id = ? AND is_active = 1",
                params![target.kind.as_str(), target.id, language_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((_, current)) = &active {
            if current == slug {
                return Ok(());
            }
        }

        if let Some((active_id, _)) = &active {
            tx.execute("UPDATE url_records SET is_active = 0 WHERE id = ?", params![active_id])?;
        }

        let previous: Option<u32> = tx
            .query_row(
                "SELECT id FROM url_records
                 WHERE entity_name = ? AND entity_id = ? AND language_id = ? AND slug = ?",
                params![target.kind.as_str(), target.id, language_id, slug],
                |row| row.get(0),
            )
            .optional()?;

        match previous {
            Some(id) => {
                tx.execute("UPDATE url_records SET is_active = 1 WHERE id = ?", params![id])?;
            }
            None => {
                tx.execute(
                    "INSERT INTO url_records (entity_name, entity_id, slug, is_active, language_id)
                     VALUES (?, ?, ?, 1, ?)",
                    params![target.kind.as_str(), target.id, slug, language_id],
                )?;
            }
        }

        tx.commit()?;
        log::debug!("{} {} slug is now '{}'", target.kind.as_str(), target.id, slug);
        Ok(())
    }

    async fn active_slug(&self, target: SlugTarget, language_id: u32) -> DomainResult<Option<String>> {
        let guard = self.conn.lock().await;
        let conn = connection(&guard)?;

        let slug = conn
            .query_row(
                "SELECT slug FROM url_records
                 WHERE entity_name = ? AND entity_id = ? AND language_id = ? AND is_active = 1",
                params![target.kind.as_str(), target.id, language_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(slug)
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        id: row.get(0)?,
        entity_name: row.get(1)?,
        entity_id: row.get(2)?,
        slug: row.get(3)?,
        is_active: row.get(4)?,
        language_id: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Summer Sale"), "summer-sale");
        assert_eq!(slugify("  Red & Blue!  "), "red-blue");
        assert_eq!(slugify("Crème brûlée"), "crème-brûlée");
    }

    #[test]
    fn test_slugify_empty_and_symbols() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(MAX_SLUG_LENGTH + 50);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LENGTH);
    }

    #[test]
    fn test_suffix_keeps_max_length() {
        let base = "a".repeat(MAX_SLUG_LENGTH);
        let slug = with_suffix(&base, 12);
        assert_eq!(slug.chars().count(), MAX_SLUG_LENGTH);
        assert!(slug.ends_with("a-12"));

        assert_eq!(with_suffix("summer-sale", 2), "summer-sale-2");
    }
}

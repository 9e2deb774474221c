//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Connection handle shared by all SQLite stores
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    pub conn: SharedConnection,
}

impl DbState {
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to pass into the stores
    pub fn handle(&self) -> SharedConnection {
        self.conn.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

impl Default for DbState {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrow the connection out of a locked handle
pub(crate) fn connection(guard: &Option<Connection>) -> DomainResult<&Connection> {
    guard
        .as_ref()
        .ok_or_else(|| DomainError::Storage("Database not initialized".to_string()))
}

/// Initialize database with path (`:memory:` for a private in-memory db)
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = Connection::open(db_path)?;

    run_migrations(&conn)?;
    log::debug!("database ready at {}", db_path.display());

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);

    Ok(state)
}

/// Id of the row just inserted on `conn`
pub(crate) fn last_insert_id(conn: &Connection) -> DomainResult<u32> {
    let rowid = conn.last_insert_rowid();
    u32::try_from(rowid).map_err(|_| DomainError::Storage(format!("row id {} out of range", rowid)))
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 1,
            deleted INTEGER NOT NULL DEFAULT 0,
            limited_to_stores INTEGER NOT NULL DEFAULT 0,
            subject_to_acl INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            updated_at INTEGER
        );

        CREATE TABLE IF NOT EXISTS item_tags (
            item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (item_id, tag_id)
        );

        CREATE TABLE IF NOT EXISTS store_mappings (
            entity_name TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            store_id INTEGER NOT NULL,
            PRIMARY KEY (entity_name, entity_id, store_id)
        );

        CREATE TABLE IF NOT EXISTS acl_records (
            entity_name TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            role_id INTEGER NOT NULL,
            PRIMARY KEY (entity_name, entity_id, role_id)
        );

        CREATE TABLE IF NOT EXISTS url_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_name TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            slug TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            language_id INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);
        CREATE INDEX IF NOT EXISTS idx_url_records_slug ON url_records(slug);",
    )?;

    Ok(())
}

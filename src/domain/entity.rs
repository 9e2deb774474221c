//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use thiserror::Error;

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Entity name used by store mappings, ACL records and slugs
    const KIND: EntityKind;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Entity type discriminator stored alongside polymorphic rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Tag,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "Item",
            EntityKind::Tag => "Tag",
        }
    }
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Expected row was missing at mutation time
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required input was missing or malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Opaque failure propagated from the storage backend
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

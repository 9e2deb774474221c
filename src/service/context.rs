//! Actor Context
//!
//! Who is asking. Tag counts depend on the caller's roles, so the role set
//! is part of the count cache key.

use async_trait::async_trait;

use crate::domain::DomainResult;

/// Supplies the current actor's role ids
#[async_trait]
pub trait WorkContext: Send + Sync {
    async fn current_role_ids(&self) -> DomainResult<Vec<u32>>;
}

/// Context with a fixed role set (background jobs, tests, single-tenant setups)
#[derive(Debug, Clone, Default)]
pub struct StaticWorkContext {
    role_ids: Vec<u32>,
}

impl StaticWorkContext {
    pub fn new(role_ids: Vec<u32>) -> Self {
        Self { role_ids }
    }
}

#[async_trait]
impl WorkContext for StaticWorkContext {
    async fn current_role_ids(&self) -> DomainResult<Vec<u32>> {
        Ok(self.role_ids.clone())
    }
}

//! Service Layer
//!
//! Tag assignment, counting and caching on top of the repositories.

mod context;
mod tag_counts;
mod tag_service;
mod visibility;


pub use context::{StaticWorkContext, WorkContext};
pub use tag_counts::count_items_per_tag;
pub use tag_service::{TagAssignmentManager, TagServiceDeps, TAG_CACHE_REGION};
pub use visibility::VisibilityPredicate;

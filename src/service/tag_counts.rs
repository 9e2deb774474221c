//! Tag Count Aggregation
//!
//! Left-join style count of distinct items per tag.

use std::collections::{HashMap, HashSet};

use crate::domain::{ItemTag, Tag};

/// Count distinct items per tag.
///
/// Every tag gets an entry, zero when nothing maps to it. Mappings to
/// tags outside `tags` are ignored. With `counted` set, only those item
/// ids contribute.
pub fn count_items_per_tag(
    tags: &[Tag],
    mappings: &[ItemTag],
    counted: Option<&HashSet<u32>>,
) -> HashMap<u32, u32> {
    let mut counts: HashMap<u32, u32> = tags.iter().map(|t| (t.id, 0)).collect();

    let distinct: HashSet<&ItemTag> = mappings.iter().collect();
    for mapping in distinct {
        if let Some(ids) = counted {
            if !ids.contains(&mapping.item_id) {
                continue;
            }
        }
        if let Some(count) = counts.get_mut(&mapping.tag_id) {
            *count += 1;
        }
    }

    counts
}

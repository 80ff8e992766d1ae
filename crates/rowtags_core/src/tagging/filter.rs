//! Exact-or-descendant tag filter predicate.
//!
//! Command-driven and sidebar-driven filtering both go through [`matches`],
//! so clicking a sidebar node selects the same rows as the equivalent
//! command.

use crate::model::tag::{DerivedTagSet, NormalizedTag};

/// True iff `target` is in `tags` or some member starts with `target/`.
pub fn matches(tags: &DerivedTagSet, target: &NormalizedTag) -> bool {
    tags.iter().any(|tag| target.covers(tag))
}

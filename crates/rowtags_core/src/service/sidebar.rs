//! Sidebar projection of the tag hierarchy.
//!
//! # Responsibility
//! - Flatten the tag forest into ordered display items.
//! - Derive stable, sanitized item ids from tag paths.
//!
//! # Invariants
//! - Item order is the forest's pre-order.
//! - Item ids are injective: distinct tags never share an id.
//! - Root items show the full path; deeper items show an indented leaf.
//! - Clicking an item filters by exactly `item.tag`.

use crate::model::tag::NormalizedTag;
use crate::repo::document::HostResult;
use crate::tagging::hierarchy::{walk_pre_order, TagHierarchyNode};

const ITEM_ID_PREFIX: &str = "tag-";
const ITEM_ID_SEPARATOR: char = '-';
const ITEM_ID_ESCAPE: char = '_';
const LABEL_INDENT: &str = "  ";

/// One display row of the tag sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    /// Stable id derived from the tag path.
    pub id: String,
    pub label: String,
    /// 0 for roots.
    pub depth: usize,
    /// Filter target bound to the item's click action.
    pub tag: NormalizedTag,
    pub synthesized: bool,
}

/// Host surface that displays sidebar items.
pub trait SidebarHost {
    /// Replaces the displayed tag tree.
    fn show_tags(&mut self, items: &[SidebarItem]) -> HostResult<()>;
}

/// Flattens a forest into display items.
pub fn sidebar_items(forest: &[TagHierarchyNode]) -> Vec<SidebarItem> {
    walk_pre_order(forest)
        .into_iter()
        .map(|(depth, node)| SidebarItem {
            id: sidebar_item_id(&node.tag),
            label: sidebar_label(&node.tag, depth),
            depth,
            tag: node.tag.clone(),
            synthesized: node.synthesized,
        })
        .collect()
}

/// `#work/q1-plan` becomes `tag-work-q1_2d_plan`.
///
/// Alphanumeric characters are kept. Every other character, `_` included,
/// is written as `_<hex code point>_`, so the `-` between segments never
/// appears inside one.
pub fn sidebar_item_id(tag: &NormalizedTag) -> String {
    let mut id = String::from(ITEM_ID_PREFIX);
    for (index, segment) in tag.segments().enumerate() {
        if index > 0 {
            id.push(ITEM_ID_SEPARATOR);
        }
        for ch in segment.chars() {
            if ch.is_alphanumeric() {
                id.push(ch);
            } else {
                id.push(ITEM_ID_ESCAPE);
                id.push_str(&format!("{:x}", u32::from(ch)));
                id.push(ITEM_ID_ESCAPE);
            }
        }
    }
    id
}

fn sidebar_label(tag: &NormalizedTag, depth: usize) -> String {
    if depth == 0 {
        tag.to_string()
    } else {
        format!("{}{}", LABEL_INDENT.repeat(depth), tag.leaf())
    }
}

#[cfg(test)]
mod tests {
    use super::{sidebar_item_id, sidebar_items};
    use crate::model::tag::NormalizedTag;
    use crate::tagging::hierarchy::build_hierarchy;
    use std::collections::{BTreeSet, HashSet};

    fn tag(raw: &str) -> NormalizedTag {
        NormalizedTag::parse(raw).expect("test tag should normalize")
    }

    #[test]
    fn ids_strip_prefix_and_escape() {
        assert_eq!(sidebar_item_id(&tag("#work")), "tag-work");
        assert_eq!(sidebar_item_id(&tag("#work/q1-plan")), "tag-work-q1_2d_plan");
        assert_eq!(sidebar_item_id(&tag("#snake_case")), "tag-snake_5f_case");
        assert_eq!(sidebar_item_id(&tag("#été/日本")), "tag-été-日本");
    }

    #[test]
    fn ids_stay_distinct_for_lookalike_paths() {
        let paths = [
            "#a/b", "#a__b", "#a_b", "#a-b", "#a/_b", "#a_/b", "#a/b_", "#a_5f_b", "#a/2d",
            "#a-2d", "#a2d",
        ];
        let ids: HashSet<String> = paths.iter().map(|path| sidebar_item_id(&tag(path))).collect();
        assert_eq!(ids.len(), paths.len());
    }

    #[test]
    fn items_follow_pre_order_with_indented_labels() {
        let tags: BTreeSet<NormalizedTag> = ["#a", "#a/b", "#a/b/c", "#x"]
            .into_iter()
            .map(tag)
            .collect();
        let items = sidebar_items(&build_hierarchy(&tags));

        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["#a", "  b", "    c", "#x"]);
        let depths: Vec<usize> = items.iter().map(|item| item.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 0]);
        assert_eq!(items[2].tag, tag("#a/b/c"));
        assert_eq!(items[2].id, "tag-a-b-c");
    }
}

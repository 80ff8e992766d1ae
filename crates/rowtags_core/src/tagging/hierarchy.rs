//! Global tag index and hierarchy construction.
//!
//! # Responsibility
//! - Union every row's persisted tag set into one global index.
//! - Build a forest of tag nodes from the flat `/`-delimited namespace.
//!
//! # Invariants
//! - A parent always has strictly fewer segments than its children.
//! - Every node is reachable from exactly one root, and the tags on that
//!   path are the node's ancestor chain.
//! - Parents missing from the index are synthesized as containers.
//! - Roots and siblings are ordered lexicographically.

use crate::config::EngineConfig;
use crate::model::tag::NormalizedTag;
use crate::repo::document::{HostResult, RowStore};
use crate::tagging::updater::read_tag_set;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

/// One node of the tag forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHierarchyNode {
    pub tag: NormalizedTag,
    /// `true` when no row carries this exact tag.
    pub synthesized: bool,
    pub children: Vec<TagHierarchyNode>,
}

/// Collects every persisted tag across the document.
///
/// Rows whose attribute cannot be read are skipped with a warning.
pub fn index_all_tags(
    store: &dyn RowStore,
    config: &EngineConfig,
) -> HostResult<BTreeSet<NormalizedTag>> {
    let mut index = BTreeSet::new();
    let mut skipped = 0usize;
    for row in store.row_ids()? {
        match read_tag_set(store, row, config) {
            Ok(Some(set)) => index.extend(set.iter().cloned()),
            Ok(None) => {}
            Err(err) => {
                skipped += 1;
                warn!("event=tag_index module=tagging status=skip row={row} error={err}");
            }
        }
    }
    debug!(
        "event=tag_index module=tagging status=ok tags={} skipped_rows={skipped}",
        index.len()
    );
    Ok(index)
}

/// Builds the tag forest from a flat tag set.
pub fn build_hierarchy<'a, I>(tags: I) -> Vec<TagHierarchyNode>
where
    I: IntoIterator<Item = &'a NormalizedTag>,
{
    let mut ordered: Vec<&NormalizedTag> = tags.into_iter().collect();
    ordered.sort_by(|left, right| {
        left.depth()
            .cmp(&right.depth())
            .then_with(|| left.cmp(right))
    });
    ordered.dedup();

    let mut arena = Arena::default();
    for tag in ordered {
        arena.find_or_create(tag, false);
    }
    arena.into_forest()
}

/// Flattens a forest in pre-order as `(depth, node)` pairs.
pub fn walk_pre_order(forest: &[TagHierarchyNode]) -> Vec<(usize, &TagHierarchyNode)> {
    let mut out = Vec::new();
    let mut stack: Vec<(usize, &TagHierarchyNode)> =
        forest.iter().rev().map(|node| (0, node)).collect();
    while let Some((depth, node)) = stack.pop() {
        out.push((depth, node));
        stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
    }
    out
}

#[derive(Default)]
struct Arena {
    nodes: Vec<ArenaNode>,
    by_tag: HashMap<NormalizedTag, usize>,
    roots: Vec<usize>,
}

struct ArenaNode {
    tag: NormalizedTag,
    synthesized: bool,
    children: Vec<usize>,
}

impl Arena {
    fn find_or_create(&mut self, tag: &NormalizedTag, synthesized: bool) -> usize {
        if let Some(&index) = self.by_tag.get(tag) {
            if !synthesized {
                self.nodes[index].synthesized = false;
            }
            return index;
        }

        let index = self.nodes.len();
        self.nodes.push(ArenaNode {
            tag: tag.clone(),
            synthesized,
            children: Vec::new(),
        });
        self.by_tag.insert(tag.clone(), index);

        match tag.parent() {
            Some(parent) => {
                let parent_index = self.find_or_create(&parent, true);
                let siblings = &mut self.nodes[parent_index].children;
                if !siblings.contains(&index) {
                    siblings.push(index);
                }
            }
            None => self.roots.push(index),
        }
        index
    }

    fn into_forest(mut self) -> Vec<TagHierarchyNode> {
        let roots = std::mem::take(&mut self.roots);
        let mut forest: Vec<TagHierarchyNode> =
            roots.into_iter().map(|index| self.materialize(index)).collect();
        forest.sort_by(|left, right| left.tag.cmp(&right.tag));
        forest
    }

    fn materialize(&self, index: usize) -> TagHierarchyNode {
        let node = &self.nodes[index];
        let mut children: Vec<TagHierarchyNode> = node
            .children
            .iter()
            .map(|child| self.materialize(*child))
            .collect();
        children.sort_by(|left, right| left.tag.cmp(&right.tag));
        TagHierarchyNode {
            tag: node.tag.clone(),
            synthesized: node.synthesized,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_hierarchy, index_all_tags, walk_pre_order, TagHierarchyNode};
    use crate::config::EngineConfig;
    use crate::model::tag::{expand_ancestors, NormalizedTag};
    use crate::repo::memory_document::MemoryDocument;
    use std::collections::BTreeSet;

    fn tags(raw: &[&str]) -> BTreeSet<NormalizedTag> {
        raw.iter()
            .map(|value| NormalizedTag::parse(value).expect("test tag should normalize"))
            .collect()
    }

    fn names(nodes: &[TagHierarchyNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.tag.as_str()).collect()
    }

    #[test]
    fn builds_nested_forest() {
        let forest = build_hierarchy(&tags(&["#a", "#a/b", "#a/b/c", "#x"]));
        assert_eq!(names(&forest), vec!["#a", "#x"]);
        assert_eq!(names(&forest[0].children), vec!["#a/b"]);
        assert_eq!(names(&forest[0].children[0].children), vec!["#a/b/c"]);
        assert!(forest[1].children.is_empty());
        assert!(forest.iter().all(|node| !node.synthesized));
    }

    #[test]
    fn synthesizes_missing_ancestors() {
        let forest = build_hierarchy(&tags(&["#x", "#p/q/r"]));
        assert_eq!(names(&forest), vec!["#p", "#x"]);

        let p = &forest[0];
        assert!(p.synthesized);
        assert!(p.children[0].synthesized);
        assert_eq!(p.children[0].tag.as_str(), "#p/q");
        assert_eq!(p.children[0].children[0].tag.as_str(), "#p/q/r");
        assert!(!p.children[0].children[0].synthesized);
    }

    #[test]
    fn siblings_are_sorted_and_not_duplicated() {
        let forest = build_hierarchy(&tags(&["#w/z", "#w/a", "#w", "#w/m"]));
        assert_eq!(forest.len(), 1);
        assert_eq!(names(&forest[0].children), vec!["#w/a", "#w/m", "#w/z"]);
        assert_eq!(walk_pre_order(&forest).len(), 4);
    }

    #[test]
    fn root_paths_equal_ancestor_chains() {
        let input = tags(&["#a/b/c", "#a/d", "#e/f/g/h", "#a"]);
        let forest = build_hierarchy(&input);

        let mut path: Vec<&NormalizedTag> = Vec::new();
        let mut seen = 0;
        for (depth, node) in walk_pre_order(&forest) {
            path.truncate(depth);
            path.push(&node.tag);
            let chain = expand_ancestors(&node.tag);
            assert_eq!(path, chain.iter().collect::<Vec<_>>());
            seen += 1;
        }
        // #a, #a/b, #a/b/c, #a/d, #e, #e/f, #e/f/g, #e/f/g/h
        assert_eq!(seen, 8);
    }

    #[test]
    fn index_skips_malformed_rows_and_keeps_the_rest() {
        let config = EngineConfig::default();
        let mut doc = MemoryDocument::new();
        let good = doc.push_row("plan #work/q1");
        let bad = doc.push_row("junk #lost");
        let other = doc.push_row("buy milk #home");
        doc.seed_attribute(good, "tags", r##"["#work","#work/q1"]"##)
            .expect("seed");
        doc.seed_attribute(bad, "tags", "{bad").expect("seed");
        doc.seed_attribute(other, "data-tags", r##"["#home"]"##)
            .expect("seed");

        let index = index_all_tags(&doc, &config).expect("index");
        assert_eq!(index, tags(&["#home", "#work", "#work/q1"]));

        let forest = build_hierarchy(&index);
        assert_eq!(names(&forest), vec!["#home", "#work"]);
        assert_eq!(names(&forest[0].children), Vec::<&str>::new());
        assert_eq!(names(&forest[1].children), vec!["#work/q1"]);
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        assert!(build_hierarchy(&BTreeSet::new()).is_empty());
    }
}

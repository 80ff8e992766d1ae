//! Tag domain model.
//!
//! # Responsibility
//! - Define the canonical tag path (`NormalizedTag`) used for identity,
//!   hashing, storage and hierarchy.
//! - Define the per-row derived tag set and its persisted JSON shape.
//!
//! # Invariants
//! - A `NormalizedTag` starts with exactly one `#` and has no empty segment.
//! - Tags are case-sensitive; normalization never folds case.
//! - A `DerivedTagSet` is always sorted and deduplicated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Leading marker of every tag path.
pub const TAG_PREFIX: char = '#';
/// Separator between hierarchy segments.
pub const SEGMENT_SEPARATOR: char = '/';

/// Canonical tag path of the form `#seg1/seg2/.../segN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedTag(String);

/// Raised when a raw value has no segment left after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyTagError(pub String);

impl Display for EmptyTagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "tag `{}` has no segment after normalization", self.0)
    }
}

impl Error for EmptyTagError {}

impl NormalizedTag {
    /// Canonicalizes a raw tag.
    ///
    /// Surrounding whitespace is trimmed, leading `#` runs collapse to one,
    /// `/` runs collapse to one and edge separators are dropped.
    /// Returns `None` when no segment remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let body = raw.trim().trim_start_matches(TAG_PREFIX);
        let mut path = String::with_capacity(body.len() + 1);
        path.push(TAG_PREFIX);
        for segment in body.split(SEGMENT_SEPARATOR).filter(|s| !s.is_empty()) {
            if path.len() > 1 {
                path.push(SEGMENT_SEPARATOR);
            }
            path.push_str(segment);
        }

        if path.len() == 1 {
            None
        } else {
            Some(Self(path))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Path segments without the leading `#`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0[1..].split(SEGMENT_SEPARATOR)
    }

    /// Number of `/`-separated segments (1 for a root tag).
    pub fn depth(&self) -> usize {
        self.0.matches(SEGMENT_SEPARATOR).count() + 1
    }

    /// Final segment, used as the short display name.
    pub fn leaf(&self) -> &str {
        match self.0.rfind(SEGMENT_SEPARATOR) {
            Some(index) => &self.0[index + 1..],
            None => &self.0[1..],
        }
    }

    /// Path minus its final segment, or `None` for a root tag.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind(SEGMENT_SEPARATOR)
            .map(|index| Self(self.0[..index].to_string()))
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    pub fn covers(&self, other: &NormalizedTag) -> bool {
        match other.0.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEGMENT_SEPARATOR),
            None => false,
        }
    }
}

impl Display for NormalizedTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NormalizedTag {
    type Error = EmptyTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(EmptyTagError(value))
    }
}

impl From<NormalizedTag> for String {
    fn from(value: NormalizedTag) -> Self {
        value.0
    }
}

/// Free-function form of [`NormalizedTag::parse`].
pub fn normalize(raw: &str) -> Option<NormalizedTag> {
    NormalizedTag::parse(raw)
}

/// Expands a tag into its ancestor chain, shallow to deep.
///
/// The last element is always `tag` itself; `#a/b/c` yields
/// `[#a, #a/b, #a/b/c]`.
pub fn expand_ancestors(tag: &NormalizedTag) -> Vec<NormalizedTag> {
    let path = tag.as_str();
    let mut chain: Vec<NormalizedTag> = path
        .match_indices(SEGMENT_SEPARATOR)
        .map(|(index, _)| NormalizedTag(path[..index].to_string()))
        .collect();
    chain.push(tag.clone());
    chain
}

/// One tag as written in row text, with its character span.
///
/// `start`/`end` are half-open offsets counted in Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// Tag text exactly as typed, including `#` and `/`.
    pub raw_tag: String,
    pub start: usize,
    pub end: usize,
}

impl TagToken {
    pub fn normalized(&self) -> Option<NormalizedTag> {
        NormalizedTag::parse(&self.raw_tag)
    }

    /// Whether a caret at `offset` touches this token (edges included).
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Sorted, deduplicated tags of one row, including every ancestor.
///
/// Persisted as a JSON array of strings. Deserializing re-establishes the
/// canonical order, so equality is a plain element-wise comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<NormalizedTag>", into = "Vec<NormalizedTag>")]
pub struct DerivedTagSet(Vec<NormalizedTag>);

impl DerivedTagSet {
    /// Builds the set from trailing tokens: union of every ancestor chain.
    pub fn from_tokens(tokens: &[TagToken]) -> Self {
        tokens
            .iter()
            .filter_map(TagToken::normalized)
            .flat_map(|tag| expand_ancestors(&tag))
            .collect()
    }

    /// Parses the persisted attribute value.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Encodes the set for attribute storage.
    pub fn to_json(&self) -> String {
        serde_json::Value::Array(
            self.0
                .iter()
                .map(|tag| serde_json::Value::String(tag.as_str().to_string()))
                .collect(),
        )
        .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, tag: &NormalizedTag) -> bool {
        self.0.binary_search(tag).is_ok()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedTag> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NormalizedTag] {
        &self.0
    }
}

impl From<Vec<NormalizedTag>> for DerivedTagSet {
    fn from(value: Vec<NormalizedTag>) -> Self {
        value.into_iter().collect()
    }
}

impl From<DerivedTagSet> for Vec<NormalizedTag> {
    fn from(value: DerivedTagSet) -> Self {
        value.0
    }
}

impl FromIterator<NormalizedTag> for DerivedTagSet {
    fn from_iter<I: IntoIterator<Item = NormalizedTag>>(iter: I) -> Self {
        let unique: BTreeSet<NormalizedTag> = iter.into_iter().collect();
        Self(unique.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DerivedTagSet {
    type Item = &'a NormalizedTag;
    type IntoIter = std::slice::Iter<'a, NormalizedTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Host row identity and text-range marker shapes.
//!
//! Rows are owned by the host document. The engine only reads their text
//! and writes attributes and markers through `repo::document::RowStore`.

use uuid::Uuid;

/// Stable host row identifier.
pub type RowId = Uuid;

/// Half-open `[start, end)` character range inside a row's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Named visual marker attached to a text range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMarker {
    /// Marker family, e.g. the tag chip or its color slot.
    pub name: String,
    /// Optional payload carried by the marker.
    pub value: Option<String>,
    pub span: TextSpan,
}

impl TextMarker {
    pub fn new(name: impl Into<String>, value: Option<String>, span: TextSpan) -> Self {
        Self {
            name: name.into(),
            value,
            span,
        }
    }
}

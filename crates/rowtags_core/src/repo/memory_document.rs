//! In-process document adapter.
//!
//! # Responsibility
//! - Hold rows, attributes and markers in memory for embedding hosts and tests.
//! - Journal every engine-issued write so callers can assert "no mutation".
//!
//! # Invariants
//! - Host-side edits (`push_row`, `set_text`) are never journaled.
//! - Row order is insertion order.

use crate::model::row::{RowId, TextMarker};
use crate::repo::document::{Document, HostError, HostResult, RowStore};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One row as held by [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    pub id: RowId,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub markers: Vec<TextMarker>,
}

impl MemoryRow {
    /// Markers with the given name, in attach order.
    pub fn markers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TextMarker> {
        self.markers.iter().filter(move |marker| marker.name == name)
    }
}

/// Engine-issued write recorded by [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetAttribute {
        row: RowId,
        key: String,
        value: String,
    },
    RemoveAttribute {
        row: RowId,
        key: String,
    },
    AttachMarker {
        row: RowId,
        marker: TextMarker,
    },
    ClearMarkers {
        row: RowId,
        name: String,
    },
}

/// Vector-backed document with a write journal.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    rows: Vec<MemoryRow>,
    journal: Vec<Mutation>,
    transactions: usize,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document with one row per text, in order.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::new();
        for text in texts {
            doc.push_row(text);
        }
        doc
    }

    /// Appends a row and returns its generated id.
    pub fn push_row(&mut self, text: impl Into<String>) -> RowId {
        let id = Uuid::new_v4();
        self.rows.push(MemoryRow {
            id,
            text: text.into(),
            attributes: BTreeMap::new(),
            markers: Vec::new(),
        });
        id
    }

    /// Replaces row text as a host edit would.
    pub fn set_text(&mut self, row: RowId, text: impl Into<String>) -> HostResult<()> {
        self.row_mut(row)?.text = text.into();
        Ok(())
    }

    /// Writes an attribute as the host would, bypassing the journal.
    pub fn seed_attribute(&mut self, row: RowId, key: &str, value: &str) -> HostResult<()> {
        self.row_mut(row)?
            .attributes
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn row(&self, row: RowId) -> Option<&MemoryRow> {
        self.rows.iter().find(|candidate| candidate.id == row)
    }

    pub fn rows(&self) -> &[MemoryRow] {
        &self.rows
    }

    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Number of committed transactions.
    pub fn transaction_count(&self) -> usize {
        self.transactions
    }

    fn row_ref(&self, row: RowId) -> HostResult<&MemoryRow> {
        self.row(row).ok_or(HostError::RowNotFound(row))
    }

    fn row_mut(&mut self, row: RowId) -> HostResult<&mut MemoryRow> {
        self.rows
            .iter_mut()
            .find(|candidate| candidate.id == row)
            .ok_or(HostError::RowNotFound(row))
    }
}

impl RowStore for MemoryDocument {
    fn row_ids(&self) -> HostResult<Vec<RowId>> {
        Ok(self.rows.iter().map(|row| row.id).collect())
    }

    fn row_text(&self, row: RowId) -> HostResult<String> {
        Ok(self.row_ref(row)?.text.clone())
    }

    fn attribute(&self, row: RowId, key: &str) -> HostResult<Option<String>> {
        Ok(self.row_ref(row)?.attributes.get(key).cloned())
    }

    fn set_attribute(&mut self, row: RowId, key: &str, value: &str) -> HostResult<()> {
        self.row_mut(row)?
            .attributes
            .insert(key.to_string(), value.to_string());
        self.journal.push(Mutation::SetAttribute {
            row,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, row: RowId, key: &str) -> HostResult<()> {
        self.row_mut(row)?.attributes.remove(key);
        self.journal.push(Mutation::RemoveAttribute {
            row,
            key: key.to_string(),
        });
        Ok(())
    }

    fn attach_marker(&mut self, row: RowId, marker: &TextMarker) -> HostResult<()> {
        self.row_mut(row)?.markers.push(marker.clone());
        self.journal.push(Mutation::AttachMarker {
            row,
            marker: marker.clone(),
        });
        Ok(())
    }

    fn clear_markers(&mut self, row: RowId, name: &str) -> HostResult<()> {
        self.row_mut(row)?
            .markers
            .retain(|marker| marker.name != name);
        self.journal.push(Mutation::ClearMarkers {
            row,
            name: name.to_string(),
        });
        Ok(())
    }
}

impl Document for MemoryDocument {
    fn transact<T>(&mut self, f: impl FnOnce(&mut dyn RowStore) -> T) -> HostResult<T> {
        let output = f(self);
        self.transactions += 1;
        Ok(output)
    }
}

//! Host document boundary.
//!
//! # Responsibility
//! - Describe the row read/write surface the engine needs from a host.
//! - Model the host's scoped write transaction as a closure boundary.
//!
//! # Invariants
//! - `Document::transact` always commits/releases on exit, including when
//!   the closure reports per-row failures.
//! - The engine never creates or destroys rows through this surface.

use crate::db::DbError;
use crate::model::row::{RowId, TextMarker};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by host adapters.
#[derive(Debug)]
pub enum HostError {
    /// Row does not exist in the document.
    RowNotFound(RowId),
    /// Host refused an operation (e.g. sidebar item creation).
    Rejected(String),
    /// Persisted host data cannot be decoded.
    InvalidData(String),
    /// SQLite-backed host failure.
    Db(DbError),
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowNotFound(id) => write!(f, "row not found: {id}"),
            Self::Rejected(message) => write!(f, "host rejected operation: {message}"),
            Self::InvalidData(message) => write!(f, "invalid host data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for HostError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for HostError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Per-row access inside one document transaction.
pub trait RowStore {
    /// Row ids in document traversal order.
    fn row_ids(&self) -> HostResult<Vec<RowId>>;
    /// Current text of one row.
    fn row_text(&self, row: RowId) -> HostResult<String>;
    /// Reads one string attribute.
    fn attribute(&self, row: RowId, key: &str) -> HostResult<Option<String>>;
    /// Writes one string attribute, replacing any previous value.
    fn set_attribute(&mut self, row: RowId, key: &str, value: &str) -> HostResult<()>;
    /// Removes one attribute; removing an absent key is not an error.
    fn remove_attribute(&mut self, row: RowId, key: &str) -> HostResult<()>;
    /// Attaches one text-range marker.
    fn attach_marker(&mut self, row: RowId, marker: &TextMarker) -> HostResult<()>;
    /// Removes every marker with `name` from the row.
    fn clear_markers(&mut self, row: RowId, name: &str) -> HostResult<()>;
}

/// Host document offering scoped write access.
pub trait Document {
    /// Runs `f` with write access and commits on exit.
    fn transact<T>(&mut self, f: impl FnOnce(&mut dyn RowStore) -> T) -> HostResult<T>;
}

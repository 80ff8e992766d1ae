//! SQLite-backed document adapter.
//!
//! # Responsibility
//! - Persist rows, string attributes and text-range markers.
//! - Map `Document::transact` onto one `IMMEDIATE` SQLite transaction.
//!
//! # Invariants
//! - Row traversal order is `position ASC, row_uuid ASC`.
//! - Attribute writes upsert on `(row_uuid, key)`.
//! - Writes against unknown rows fail with `HostError::RowNotFound`.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::row::{RowId, TextMarker, TextSpan};
use crate::repo::document::{Document, HostError, HostResult, RowStore};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use uuid::Uuid;

/// Document stored in a migrated SQLite connection.
pub struct SqliteDocument {
    conn: Connection,
}

impl SqliteDocument {
    /// Wraps a connection returned by `open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        open_db(path).map(Self::new)
    }

    pub fn open_in_memory() -> DbResult<Self> {
        open_db_in_memory().map(Self::new)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Appends one row at the end of the document.
    pub fn insert_row(&self, text: &str) -> HostResult<RowId> {
        let row = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO rows (row_uuid, position, text)
             VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM rows), ?2);",
            params![row.to_string(), text],
        )?;
        Ok(row)
    }

    /// Replaces the text of one row as a host edit would.
    pub fn update_row_text(&self, row: RowId, text: &str) -> HostResult<()> {
        let changed = self.conn.execute(
            "UPDATE rows
             SET text = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE row_uuid = ?1;",
            params![row.to_string(), text],
        )?;
        if changed == 0 {
            return Err(HostError::RowNotFound(row));
        }
        Ok(())
    }

    /// Lists markers of one row ordered by span then name.
    pub fn markers(&self, row: RowId) -> HostResult<Vec<TextMarker>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value, span_start, span_end
             FROM row_markers
             WHERE row_uuid = ?1
             ORDER BY span_start ASC, name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([row.to_string()])?;
        let mut markers = Vec::new();
        while let Some(record) = rows.next()? {
            let start: i64 = record.get("span_start")?;
            let end: i64 = record.get("span_end")?;
            markers.push(TextMarker {
                name: record.get("name")?,
                value: record.get("value")?,
                span: TextSpan::new(offset_from_db(start)?, offset_from_db(end)?),
            });
        }
        Ok(markers)
    }

    /// Read-only view for snapshot reads outside a transaction.
    pub fn reader(&self) -> SqliteRowStore<'_> {
        SqliteRowStore::new(&self.conn)
    }
}

impl Document for SqliteDocument {
    fn transact<T>(&mut self, f: impl FnOnce(&mut dyn RowStore) -> T) -> HostResult<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let output = {
            let mut store = SqliteRowStore::new(&tx);
            f(&mut store)
        };
        tx.commit()?;
        Ok(output)
    }
}

/// `RowStore` over a borrowed connection or open transaction.
pub struct SqliteRowStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRowStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn ensure_row(&self, row: RowId) -> HostResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM rows WHERE row_uuid = ?1);",
            [row.to_string()],
            |record| record.get(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(HostError::RowNotFound(row))
        }
    }
}

impl RowStore for SqliteRowStore<'_> {
    fn row_ids(&self) -> HostResult<Vec<RowId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT row_uuid FROM rows ORDER BY position ASC, row_uuid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();
        while let Some(record) = rows.next()? {
            let text: String = record.get(0)?;
            ids.push(parse_uuid(&text)?);
        }
        Ok(ids)
    }

    fn row_text(&self, row: RowId) -> HostResult<String> {
        self.conn
            .query_row(
                "SELECT text FROM rows WHERE row_uuid = ?1;",
                [row.to_string()],
                |record| record.get(0),
            )
            .optional()?
            .ok_or(HostError::RowNotFound(row))
    }

    fn attribute(&self, row: RowId, key: &str) -> HostResult<Option<String>> {
        self.ensure_row(row)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM row_attributes WHERE row_uuid = ?1 AND key = ?2;",
                params![row.to_string(), key],
                |record| record.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_attribute(&mut self, row: RowId, key: &str, value: &str) -> HostResult<()> {
        self.ensure_row(row)?;
        self.conn.execute(
            "INSERT INTO row_attributes (row_uuid, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (row_uuid, key) DO UPDATE SET value = excluded.value;",
            params![row.to_string(), key, value],
        )?;
        Ok(())
    }

    fn remove_attribute(&mut self, row: RowId, key: &str) -> HostResult<()> {
        self.ensure_row(row)?;
        self.conn.execute(
            "DELETE FROM row_attributes WHERE row_uuid = ?1 AND key = ?2;",
            params![row.to_string(), key],
        )?;
        Ok(())
    }

    fn attach_marker(&mut self, row: RowId, marker: &TextMarker) -> HostResult<()> {
        self.ensure_row(row)?;
        self.conn.execute(
            "INSERT INTO row_markers (row_uuid, name, value, span_start, span_end)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                row.to_string(),
                marker.name.as_str(),
                marker.value.as_deref(),
                offset_to_db(marker.span.start)?,
                offset_to_db(marker.span.end)?,
            ],
        )?;
        Ok(())
    }

    fn clear_markers(&mut self, row: RowId, name: &str) -> HostResult<()> {
        self.ensure_row(row)?;
        self.conn.execute(
            "DELETE FROM row_markers WHERE row_uuid = ?1 AND name = ?2;",
            params![row.to_string(), name],
        )?;
        Ok(())
    }
}

fn parse_uuid(value: &str) -> HostResult<RowId> {
    Uuid::parse_str(value)
        .map_err(|_| HostError::InvalidData(format!("invalid uuid value `{value}` in rows.row_uuid")))
}

fn offset_to_db(offset: usize) -> HostResult<i64> {
    i64::try_from(offset)
        .map_err(|_| HostError::InvalidData(format!("marker offset {offset} out of range")))
}

fn offset_from_db(offset: i64) -> HostResult<usize> {
    usize::try_from(offset).map_err(|_| {
        HostError::InvalidData(format!("invalid marker offset `{offset}` in row_markers"))
    })
}

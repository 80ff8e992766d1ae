//! Domain model for tag derivation over host rows.
//!
//! # Responsibility
//! - Define canonical tag values and the per-row derived tag set.
//! - Define the row-side shapes (`RowId`, spans, markers) the engine writes.
//!
//! # Invariants
//! - Tag identity is the normalized path string; nothing else is hashed,
//!   stored or compared.
//! - An untagged row carries no tag-set attribute at all.

pub mod row;
pub mod tag;

//! Host document boundary and its adapters.
//!
//! # Responsibility
//! - Define the row/attribute/marker surface the engine writes through.
//! - Provide an in-memory host and a SQLite-backed host.

pub mod document;
pub mod memory_document;
pub mod sqlite_document;

//! Tag derivation engine.
//!
//! # Responsibility
//! - Tokenize trailing tags, assign stable colors and keep each row's
//!   persisted tag set in sync with its text.
//! - Index persisted tags into a hierarchy and answer filter queries.
//!
//! # Invariants
//! - Derivation of one row never reads or writes another row.
//! - The hierarchy is rebuilt from committed state only.

pub mod color;
pub mod filter;
pub mod hierarchy;
pub mod tokenizer;
pub mod updater;

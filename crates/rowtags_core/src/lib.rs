//! Hierarchical tag engine for row-structured documents.
//!
//! Rows end in `#tag` or `#parent/child` tokens. The engine derives each
//! row's tag set, colors the chips, builds a tag hierarchy for the sidebar
//! and filters rows by tag.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tagging;

pub use config::{ConfigError, EngineConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::row::{RowId, TextMarker, TextSpan};
pub use model::tag::{expand_ancestors, normalize, DerivedTagSet, NormalizedTag, TagToken};
pub use repo::document::{Document, HostError, HostResult, RowStore};
pub use repo::memory_document::MemoryDocument;
pub use repo::sqlite_document::SqliteDocument;
pub use service::selection::{SelectionEvent, SelectionKind, SelectionState};
pub use service::sidebar::{SidebarHost, SidebarItem};
pub use service::tag_service::{ApplySummary, TagService};
pub use service::window::{SidebarStatus, WindowId};
pub use tagging::hierarchy::TagHierarchyNode;
pub use tagging::updater::RowUpdateOutcome;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

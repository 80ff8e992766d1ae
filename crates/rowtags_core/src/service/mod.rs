//! Engine commands and per-window orchestration.

pub mod selection;
pub mod sidebar;
pub mod tag_service;
pub mod window;

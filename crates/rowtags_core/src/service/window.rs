//! Per-window engine state.
//!
//! # Invariants
//! - State exists only between `open` and `close` for a window id.
//! - Opening an already-open window keeps its existing state.

use crate::service::selection::SelectionTracker;
use crate::service::sidebar::SidebarItem;
use std::collections::BTreeMap;

/// Stable host window identifier.
pub type WindowId = u64;

/// Sidebar availability for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarStatus {
    /// No rebuild attempted yet.
    #[default]
    Pending,
    Available,
    /// Host rejected the sidebar; tagging keeps working without it.
    Unavailable,
}

/// Engine state owned for one open window.
#[derive(Debug, Clone, Default)]
pub struct WindowState {
    pub selection: SelectionTracker,
    pub sidebar_status: SidebarStatus,
    /// Items most recently handed to the host.
    pub sidebar_items: Vec<SidebarItem>,
}

impl WindowState {
    /// Looks up a displayed item by id.
    pub fn sidebar_item(&self, item_id: &str) -> Option<&SidebarItem> {
        self.sidebar_items.iter().find(|item| item.id == item_id)
    }
}

/// Window id → state mapping owned by the engine.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: BTreeMap<WindowId, WindowState>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a window; returns `false` if it was already open.
    pub fn open(&mut self, window: WindowId) -> bool {
        if self.windows.contains_key(&window) {
            return false;
        }
        self.windows.insert(window, WindowState::default());
        true
    }

    /// Drops a window's state; returns `false` if it was not open.
    pub fn close(&mut self, window: WindowId) -> bool {
        self.windows.remove(&window).is_some()
    }

    pub fn get(&self, window: WindowId) -> Option<&WindowState> {
        self.windows.get(&window)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut WindowState> {
        self.windows.get_mut(&window)
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

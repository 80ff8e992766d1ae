//! Selection state machine driving row re-derivation.
//!
//! # Invariants
//! - States are `NoSelection`, `Editing { row, kind }` and `BlockSelected`.
//! - A row is reported as left exactly on a transition out of `Editing`
//!   for that row; switching caret/range within the same row is not a leave.

use crate::model::row::RowId;

/// How text is selected inside the edited row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Caret,
    TextRange,
}

/// Debounced selection notification from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Caret or text range inside one row.
    Text { row: RowId, kind: SelectionKind },
    /// One or more whole rows selected as blocks.
    Blocks,
    /// Focus left the document.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    NoSelection,
    Editing {
        row: RowId,
        kind: SelectionKind,
    },
    BlockSelected,
}

/// Tracks selection transitions for one window.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    state: SelectionState,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Applies one event and returns the row that was just left, if any.
    pub fn on_event(&mut self, event: SelectionEvent) -> Option<RowId> {
        let next = match event {
            SelectionEvent::Text { row, kind } => SelectionState::Editing { row, kind },
            SelectionEvent::Blocks => SelectionState::BlockSelected,
            SelectionEvent::Cleared => SelectionState::NoSelection,
        };

        let left = match (self.state, next) {
            (
                SelectionState::Editing { row: previous, .. },
                SelectionState::Editing { row: current, .. },
            ) if previous == current => None,
            (SelectionState::Editing { row: previous, .. }, _) => Some(previous),
            _ => None,
        };

        self.state = next;
        left
    }
}

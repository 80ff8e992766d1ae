//! Tag command service.
//!
//! # Responsibility
//! - Expose the outward commands: apply tags, filter by tag (at caret or by
//!   sidebar click), clear filter and rebuild the sidebar.
//! - Own per-window state and react to selection/content notifications.
//!
//! # Invariants
//! - Commands report success as `bool` and never propagate errors.
//! - Every document write happens inside one `Document::transact` scope.
//! - Per-row failures are logged and isolated; the pass continues.
//! - The sidebar is rebuilt only from committed row state.

use crate::config::{ConfigError, EngineConfig, FILTER_MARK_VALUE};
use crate::model::row::RowId;
use crate::model::tag::NormalizedTag;
use crate::repo::document::{Document, HostResult, RowStore};
use crate::service::selection::SelectionEvent;
use crate::service::sidebar::{sidebar_items, SidebarHost};
use crate::service::window::{SidebarStatus, WindowId, WindowRegistry};
use crate::tagging::filter::matches;
use crate::tagging::hierarchy::{build_hierarchy, index_all_tags, TagHierarchyNode};
use crate::tagging::tokenizer::{tag_at, trailing_tokens};
use crate::tagging::updater::{read_tag_set, update_row_tags, RowUpdateOutcome};
use log::{error, info, warn};

/// Counters reported by one apply-tags pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub rows: usize,
    pub updated: usize,
    pub cleared: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Process-wide tag engine context.
#[derive(Debug)]
pub struct TagService {
    config: EngineConfig,
    windows: WindowRegistry,
}

impl TagService {
    /// Creates the service after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            windows: WindowRegistry::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    /// Window-created notification. Returns `false` if already tracked.
    pub fn window_opened(&mut self, window: WindowId) -> bool {
        let opened = self.windows.open(window);
        info!(
            "event=window_open module=service status=ok window={window} new={opened} open_windows={}",
            self.windows.len()
        );
        opened
    }

    /// Window-destroyed notification. Returns `false` if unknown.
    pub fn window_closed(&mut self, window: WindowId) -> bool {
        let closed = self.windows.close(window);
        info!(
            "event=window_close module=service status=ok window={window} known={closed} open_windows={}",
            self.windows.len()
        );
        closed
    }

    /// Command: recompute every row's tags.
    pub fn apply_tags<D: Document>(&self, doc: &mut D) -> bool {
        self.apply_tags_with_summary(doc).is_some()
    }

    /// [`Self::apply_tags`] returning per-outcome counters.
    pub fn apply_tags_with_summary<D: Document>(&self, doc: &mut D) -> Option<ApplySummary> {
        let result = doc.transact(|store| -> HostResult<ApplySummary> {
            let mut summary = ApplySummary::default();
            for row in store.row_ids()? {
                summary.rows += 1;
                match update_row_tags(store, row, &self.config) {
                    Ok(RowUpdateOutcome::Updated { .. }) => summary.updated += 1,
                    Ok(RowUpdateOutcome::Cleared) => summary.cleared += 1,
                    Ok(RowUpdateOutcome::Unchanged | RowUpdateOutcome::Untagged) => {
                        summary.unchanged += 1
                    }
                    Err(err) => {
                        summary.failed += 1;
                        warn!("event=apply_tags module=service status=skip row={row} error={err}");
                    }
                }
            }
            Ok(summary)
        });

        match result {
            Ok(Ok(summary)) => {
                info!(
                    "event=apply_tags module=service status=ok rows={} updated={} cleared={} unchanged={} failed={}",
                    summary.rows, summary.updated, summary.cleared, summary.unchanged, summary.failed
                );
                Some(summary)
            }
            Ok(Err(err)) | Err(err) => {
                error!("event=apply_tags module=service status=error error={err}");
                None
            }
        }
    }

    /// Re-derives a single row, e.g. after the caret left it.
    pub fn apply_row_tags<D: Document>(&self, doc: &mut D, row: RowId) -> Option<RowUpdateOutcome> {
        match doc.transact(|store| update_row_tags(store, row, &self.config)) {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(err)) | Err(err) => {
                warn!("event=row_tags module=service status=error row={row} error={err}");
                None
            }
        }
    }

    /// Command: filter by the tag under the caret, else the row's last
    /// trailing tag. Returns `false` when no tag resolves.
    pub fn filter_by_tag_at_caret<D: Document>(
        &self,
        doc: &mut D,
        row: RowId,
        caret: Option<usize>,
    ) -> bool {
        let text = match doc.transact(|store| store.row_text(row)) {
            Ok(Ok(text)) => text,
            Ok(Err(err)) | Err(err) => {
                warn!("event=filter_at_caret module=service status=error row={row} error={err}");
                return false;
            }
        };

        match resolve_caret_target(&text, caret) {
            Some(target) => self.filter_by_target(doc, &target),
            None => {
                info!("event=filter_at_caret module=service status=skip row={row} reason=no_tag");
                false
            }
        }
    }

    /// Sidebar click action: marks every row matching `target`.
    pub fn filter_by_tag<D: Document>(&self, doc: &mut D, target: &str) -> bool {
        match NormalizedTag::parse(target) {
            Some(target) => self.filter_by_target(doc, &target),
            None => {
                info!("event=filter_by_tag module=service status=skip reason=empty_target");
                false
            }
        }
    }

    /// Resolves a displayed sidebar item and filters by its tag.
    pub fn click_sidebar_item<D: Document>(
        &self,
        window: WindowId,
        doc: &mut D,
        item_id: &str,
    ) -> bool {
        let Some(tag) = self
            .windows
            .get(window)
            .and_then(|state| state.sidebar_item(item_id))
            .map(|item| item.tag.clone())
        else {
            warn!("event=sidebar_click module=service status=skip window={window} item={item_id}");
            return false;
        };
        self.filter_by_target(doc, &tag)
    }

    /// Command: removes filter markers from every row.
    pub fn clear_filter<D: Document>(&self, doc: &mut D) -> bool {
        let result = doc.transact(|store| -> HostResult<usize> {
            let mut cleared = 0;
            for row in store.row_ids()? {
                match self.clear_filter_row(store, row) {
                    Ok(true) => cleared += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!("event=clear_filter module=service status=skip row={row} error={err}")
                    }
                }
            }
            Ok(cleared)
        });

        match result {
            Ok(Ok(cleared)) => {
                info!("event=clear_filter module=service status=ok cleared_rows={cleared}");
                true
            }
            Ok(Err(err)) | Err(err) => {
                error!("event=clear_filter module=service status=error error={err}");
                false
            }
        }
    }

    /// Rows currently marked by the filter, in document order.
    pub fn filtered_rows<D: Document>(&self, doc: &mut D) -> Option<Vec<RowId>> {
        let key = self.config.filter_attribute.as_str();
        let result = doc.transact(|store| -> HostResult<Vec<RowId>> {
            let mut rows = Vec::new();
            for row in store.row_ids()? {
                if store.attribute(row, key)?.is_some() {
                    rows.push(row);
                }
            }
            Ok(rows)
        });
        match result {
            Ok(Ok(rows)) => Some(rows),
            Ok(Err(err)) | Err(err) => {
                error!("event=filtered_rows module=service status=error error={err}");
                None
            }
        }
    }

    /// Builds the tag forest from the committed tag sets.
    pub fn tag_hierarchy<D: Document>(&self, doc: &mut D) -> Option<Vec<TagHierarchyNode>> {
        match doc.transact(|store| index_all_tags(&*store, &self.config)) {
            Ok(Ok(index)) => Some(build_hierarchy(&index)),
            Ok(Err(err)) | Err(err) => {
                error!("event=tag_hierarchy module=service status=error error={err}");
                None
            }
        }
    }

    /// Command: rebuilds the hierarchy and hands it to the window's sidebar.
    ///
    /// A host rejection marks the sidebar unavailable for that window and
    /// returns `false`; tagging commands keep working.
    pub fn rebuild_sidebar<D: Document, S: SidebarHost>(
        &mut self,
        window: WindowId,
        doc: &mut D,
        host: &mut S,
    ) -> bool {
        if self.windows.get(window).is_none() {
            warn!("event=sidebar_rebuild module=service status=skip window={window} reason=unknown_window");
            return false;
        }
        let Some(forest) = self.tag_hierarchy(doc) else {
            return false;
        };
        let items = sidebar_items(&forest);
        let shown = host.show_tags(&items);

        let Some(state) = self.windows.get_mut(window) else {
            return false;
        };
        match shown {
            Ok(()) => {
                info!(
                    "event=sidebar_rebuild module=service status=ok window={window} items={}",
                    items.len()
                );
                state.sidebar_status = SidebarStatus::Available;
                state.sidebar_items = items;
                true
            }
            Err(err) => {
                warn!("event=sidebar_rebuild module=service status=degraded window={window} error={err}");
                state.sidebar_status = SidebarStatus::Unavailable;
                state.sidebar_items.clear();
                false
            }
        }
    }

    /// Selection notification; re-derives the row being left, if any.
    pub fn on_selection_changed<D: Document>(
        &mut self,
        window: WindowId,
        doc: &mut D,
        event: SelectionEvent,
    ) -> Option<RowUpdateOutcome> {
        let Some(state) = self.windows.get_mut(window) else {
            warn!("event=selection module=service status=skip window={window} reason=unknown_window");
            return None;
        };
        let left = state.selection.on_event(event)?;
        self.apply_row_tags(doc, left)
    }

    /// Content-change notification, delivered after the host committed.
    pub fn on_document_changed<D: Document, S: SidebarHost>(
        &mut self,
        window: WindowId,
        doc: &mut D,
        host: &mut S,
    ) -> bool {
        self.rebuild_sidebar(window, doc, host)
    }

    fn filter_by_target<D: Document>(&self, doc: &mut D, target: &NormalizedTag) -> bool {
        let result = doc.transact(|store| -> HostResult<usize> {
            let mut matched = 0;
            for row in store.row_ids()? {
                match self.mark_filter_row(store, row, target) {
                    Ok(true) => matched += 1,
                    Ok(false) => {}
                    Err(err) => warn!(
                        "event=filter_by_tag module=service status=skip row={row} error={err}"
                    ),
                }
            }
            Ok(matched)
        });

        match result {
            Ok(Ok(matched)) => {
                info!("event=filter_by_tag module=service status=ok target={target} matched_rows={matched}");
                true
            }
            Ok(Err(err)) | Err(err) => {
                error!("event=filter_by_tag module=service status=error target={target} error={err}");
                false
            }
        }
    }

    fn mark_filter_row(
        &self,
        store: &mut dyn RowStore,
        row: RowId,
        target: &NormalizedTag,
    ) -> HostResult<bool> {
        let tags = read_tag_set(&*store, row, &self.config)?.unwrap_or_default();
        if !matches(&tags, target) {
            self.clear_filter_row(store, row)?;
            return Ok(false);
        }
        for key in self.config.filter_keys() {
            if store.attribute(row, key)?.as_deref() != Some(FILTER_MARK_VALUE) {
                store.set_attribute(row, key, FILTER_MARK_VALUE)?;
            }
        }
        Ok(true)
    }

    fn clear_filter_row(&self, store: &mut dyn RowStore, row: RowId) -> HostResult<bool> {
        let mut removed = false;
        for key in self.config.filter_keys() {
            if store.attribute(row, key)?.is_some() {
                store.remove_attribute(row, key)?;
                removed = true;
            }
        }
        Ok(removed)
    }
}

/// Picks the filter target for a caret position in `text`.
///
/// The tag under the caret wins; otherwise the last trailing tag is used.
pub fn resolve_caret_target(text: &str, caret: Option<usize>) -> Option<NormalizedTag> {
    caret
        .and_then(|offset| tag_at(text, offset))
        .or_else(|| trailing_tokens(text).pop())
        .and_then(|token| token.normalized())
}

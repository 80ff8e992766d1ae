//! Change-gated per-row tag derivation.
//!
//! # Responsibility
//! - Derive a row's tag set from its trailing tokens.
//! - Write chips, colors and the persisted set only when the set changed.
//!
//! # Invariants
//! - Re-running on an unchanged row issues no write at all.
//! - An untagged row ends with neither tag-set key present.
//! - Only the target row's attributes and markers are touched.

use crate::config::EngineConfig;
use crate::model::row::{RowId, TextMarker, TextSpan};
use crate::model::tag::{DerivedTagSet, TagToken};
use crate::repo::document::{HostResult, RowStore};
use crate::tagging::color::color_slot;
use crate::tagging::tokenizer::trailing_tokens;
use log::{debug, warn};

/// Result of one change-gated row update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowUpdateOutcome {
    /// No trailing tags and nothing persisted; nothing written.
    Untagged,
    /// Candidate set equals the persisted set; nothing written.
    Unchanged,
    /// Row lost its tags; persisted set and chips removed.
    Cleared,
    /// New set persisted and chips re-attached.
    Updated { tags: DerivedTagSet },
}

impl RowUpdateOutcome {
    /// Whether the row was mutated.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Cleared | Self::Updated { .. })
    }
}

/// Reads the persisted tag set of one row.
///
/// Tries the current key, then the legacy key. A malformed payload is
/// logged and the next key is tried; `None` when no key holds a valid set.
pub fn read_tag_set(
    store: &dyn RowStore,
    row: RowId,
    config: &EngineConfig,
) -> HostResult<Option<DerivedTagSet>> {
    for key in config.tag_set_keys() {
        let Some(raw) = store.attribute(row, key)? else {
            continue;
        };
        match DerivedTagSet::from_json(&raw) {
            Ok(set) => return Ok(Some(set)),
            Err(err) => warn!(
                "event=tag_set_parse module=tagging status=skip row={row} key={key} error={err}"
            ),
        }
    }
    Ok(None)
}

/// Recomputes one row's tags and writes only on change.
pub fn update_row_tags(
    store: &mut dyn RowStore,
    row: RowId,
    config: &EngineConfig,
) -> HostResult<RowUpdateOutcome> {
    let text = store.row_text(row)?;
    let tokens = trailing_tokens(&text);
    let candidate = DerivedTagSet::from_tokens(&tokens);

    if candidate.is_empty() {
        if !has_tag_set_attribute(&*store, row, config)? {
            return Ok(RowUpdateOutcome::Untagged);
        }
        clear_tag_markers(store, row, config)?;
        for key in config.tag_set_keys() {
            store.remove_attribute(row, key)?;
        }
        debug!("event=row_tags module=tagging status=cleared row={row}");
        return Ok(RowUpdateOutcome::Cleared);
    }

    if read_tag_set(&*store, row, config)?.as_ref() == Some(&candidate) {
        return Ok(RowUpdateOutcome::Unchanged);
    }

    clear_tag_markers(store, row, config)?;
    attach_tag_markers(store, row, &tokens, config)?;
    let payload = candidate.to_json();
    for key in config.tag_set_keys() {
        store.set_attribute(row, key, &payload)?;
    }

    debug!(
        "event=row_tags module=tagging status=updated row={row} tokens={} tags={}",
        tokens.len(),
        candidate.len()
    );
    Ok(RowUpdateOutcome::Updated { tags: candidate })
}

fn has_tag_set_attribute(
    store: &dyn RowStore,
    row: RowId,
    config: &EngineConfig,
) -> HostResult<bool> {
    for key in config.tag_set_keys() {
        if store.attribute(row, key)?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn clear_tag_markers(
    store: &mut dyn RowStore,
    row: RowId,
    config: &EngineConfig,
) -> HostResult<()> {
    store.clear_markers(row, &config.tag_marker)?;
    store.clear_markers(row, &config.color_marker)
}

fn attach_tag_markers(
    store: &mut dyn RowStore,
    row: RowId,
    tokens: &[TagToken],
    config: &EngineConfig,
) -> HostResult<()> {
    for token in tokens {
        let Some(tag) = token.normalized() else {
            continue;
        };
        let span = TextSpan::new(token.start, token.end);
        let slot = color_slot(&tag, config.palette_size);
        store.attach_marker(
            row,
            &TextMarker::new(config.tag_marker.as_str(), Some(tag.to_string()), span),
        )?;
        store.attach_marker(
            row,
            &TextMarker::new(config.color_marker.as_str(), Some(slot.to_string()), span),
        )?;
    }
    Ok(())
}

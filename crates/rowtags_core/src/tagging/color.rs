//! Stable color slot assignment.
//!
//! The slot is a djb2 hash (seed 5381, `hash * 33 + unit`) over the tag's
//! UTF-16 code units, kept in a wrapping signed 32-bit accumulator, folded to
//! its absolute value and reduced modulo the palette size. Colors are never
//! persisted, so this exact arithmetic is the compatibility contract.

use crate::model::tag::NormalizedTag;

const DJB2_SEED: i32 = 5381;

/// Raw 32-bit djb2 hash of a tag path.
pub fn tag_hash(tag: &NormalizedTag) -> i32 {
    tag.as_str()
        .encode_utf16()
        .fold(DJB2_SEED, |hash, unit| {
            hash.wrapping_mul(33).wrapping_add(i32::from(unit))
        })
}

/// Maps a tag to a slot in `[0, palette_size)`.
///
/// A zero palette maps everything to slot 0.
pub fn color_slot(tag: &NormalizedTag, palette_size: u32) -> u32 {
    if palette_size == 0 {
        return 0;
    }
    tag_hash(tag).unsigned_abs() % palette_size
}

//! Cutting-segment computation: the clear spans between stable defects.
//!
//! A single left-to-right sweep over the stable boxes sorted by `x`.
//! Each emitted segment spans the board's full height and is wider
//! than the configured minimum, so every segment is a usable cut.
//!
//! # Known limitation
//!
//! Overlapping or nested defect boxes are not special-cased: the sweep
//! uses each box's raw `x` and `x + width` regardless of nesting, so
//! the cursor can move backward past a span a wider box already
//! covered, under- or over-reporting gaps for such input. Deliberately
//! preserved rather than replaced with interval merging.

use crate::types::Rect;

/// Compute the clear cutting segments of a board.
///
/// Sorts `stable` by ascending `x` (stable sort, so equal-`x` boxes
/// keep their input order) and sweeps a cursor from the board's left
/// edge. A gap strictly wider than `min_segment_width` between the
/// cursor and the next box, or between the cursor and the board's
/// right edge after the last box, becomes a segment at the board's
/// `y` with the board's full height.
///
/// Deterministic for a given input; segments are disjoint and ordered
/// left to right (for non-overlapping input; see the module docs).
#[must_use = "returns the cutting segments ordered left to right"]
pub fn cutting_segments(board: Rect, stable: &[Rect], min_segment_width: u32) -> Vec<Rect> {
    let mut boxes: Vec<Rect> = stable.to_vec();
    boxes.sort_by_key(|b| b.x);

    let mut segments = Vec::new();
    let mut cursor = i64::from(board.x);

    for b in &boxes {
        let gap = i64::from(b.x) - cursor;
        if gap > i64::from(min_segment_width) {
            segments.push(span_segment(board, cursor, gap));
        }
        cursor = i64::from(b.right());
    }

    let trailing = i64::from(board.right()) - cursor;
    if trailing > i64::from(min_segment_width) {
        segments.push(span_segment(board, cursor, trailing));
    }

    segments
}

/// A board-height segment starting at `x` with the given width.
///
/// `x` and `width` come from the sweep and are non-negative whenever a
/// segment is emitted (the gap check already ensured `width > 0`).
fn span_segment(board: Rect, x: i64, width: i64) -> Rect {
    #[allow(clippy::cast_sign_loss)]
    Rect::new(x.max(0) as u32, board.y, width.max(0) as u32, board.height)
}

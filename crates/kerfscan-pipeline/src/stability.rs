//! Cross-frame stability filtering for defect candidates.
//!
//! A candidate must be geometrically consistent across two consecutive
//! ticks before it is shown: one tick of latency traded for flicker
//! suppression. Matching is pure existence; any single previous box
//! within the per-axis tolerance confirms a candidate; there is no
//! nearest-neighbor search and no one-to-one assignment.

use crate::types::Rect;

/// Keep the current-tick boxes confirmed by the previous tick.
///
/// A current box is stable iff some previous box satisfies
/// `|prev.x - cur.x| < tolerance` and `|prev.y - cur.y| < tolerance`
/// (strict, independent per axis). Unstable boxes are dropped from
/// the tick's output entirely. Output preserves `current` order.
///
/// With an empty `previous` set every candidate is unstable, so the
/// first tick after start reports no defects.
#[must_use = "returns the stable subset of the current boxes"]
pub fn filter_stable(current: &[Rect], previous: &[Rect], tolerance: u32) -> Vec<Rect> {
    current
        .iter()
        .filter(|cur| {
            previous
                .iter()
                .any(|prev| prev.x.abs_diff(cur.x) < tolerance && prev.y.abs_diff(cur.y) < tolerance)
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: u32 = 15;

    #[test]
    fn empty_previous_rejects_everything() {
        let cur = [Rect::new(100, 100, 50, 50)];
        assert!(filter_stable(&cur, &[], TOLERANCE).is_empty());
    }

    #[test]
    fn exact_match_is_stable() {
        let boxes = [Rect::new(100, 100, 50, 50)];
        assert_eq!(filter_stable(&boxes, &boxes, TOLERANCE), boxes);
    }

    #[test]
    fn within_tolerance_on_both_axes_is_stable() {
        let cur = [Rect::new(114, 86, 50, 50)];
        let prev = [Rect::new(100, 100, 50, 50)];
        assert_eq!(filter_stable(&cur, &prev, TOLERANCE), cur);
    }

    #[test]
    fn tolerance_is_strict() {
        // Offset of exactly 15 on one axis fails the strict `< 15`.
        let prev = [Rect::new(100, 100, 50, 50)];
        let at_limit = [Rect::new(115, 100, 50, 50)];
        assert!(filter_stable(&at_limit, &prev, TOLERANCE).is_empty());
        let inside = [Rect::new(114, 100, 50, 50)];
        assert_eq!(filter_stable(&inside, &prev, TOLERANCE), inside);
    }

    #[test]
    fn one_axis_match_is_not_enough() {
        let prev = [Rect::new(100, 100, 50, 50)];
        let cur = [Rect::new(105, 300, 50, 50)];
        assert!(filter_stable(&cur, &prev, TOLERANCE).is_empty());
    }

    #[test]
    fn any_single_previous_match_suffices() {
        let prev = [Rect::new(500, 500, 40, 40), Rect::new(102, 98, 40, 40)];
        let cur = [Rect::new(100, 100, 50, 50)];
        assert_eq!(filter_stable(&cur, &prev, TOLERANCE), cur);
    }

    #[test]
    fn one_previous_box_may_confirm_many_candidates() {
        // No one-to-one assignment: both candidates sit near the same
        // previous box and both survive.
        let prev = [Rect::new(100, 100, 40, 40)];
        let cur = [Rect::new(95, 100, 40, 40), Rect::new(105, 100, 40, 40)];
        assert_eq!(filter_stable(&cur, &prev, TOLERANCE), cur);
    }

    #[test]
    fn size_change_does_not_matter() {
        // Only the origin is compared; a box that grew is still stable.
        let prev = [Rect::new(100, 100, 40, 40)];
        let cur = [Rect::new(100, 100, 200, 180)];
        assert_eq!(filter_stable(&cur, &prev, TOLERANCE), cur);
    }

    #[test]
    fn output_preserves_current_order() {
        let prev = [Rect::new(0, 0, 40, 40), Rect::new(300, 300, 40, 40)];
        let cur = [
            Rect::new(301, 301, 40, 40),
            Rect::new(150, 150, 40, 40),
            Rect::new(1, 1, 40, 40),
        ];
        assert_eq!(
            filter_stable(&cur, &prev, TOLERANCE),
            vec![cur[0], cur[2]]
        );
    }
}

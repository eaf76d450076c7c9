//! Board localization: pick one rectangle as the workpiece.
//!
//! Candidates come from external contours of the globally thresholded
//! frame. Selection is maximum area within an open aspect-ratio
//! window; everything else in the frame (clamps, off-cuts, the
//! conveyor edge) is either the wrong shape or smaller than the board.

use image::GrayImage;

use crate::preprocess;
use crate::types::{PipelineConfig, Rect};

/// Candidate board rectangles from a grayscale frame.
///
/// Blur, global binary threshold, external-contour bounding
/// rectangles, in contour-extraction order.
#[must_use = "returns the candidate rectangles"]
pub fn board_candidates(gray: &GrayImage, config: &PipelineConfig) -> Vec<Rect> {
    let blurred = preprocess::blur(gray, config.blur_sigma);
    let binary = preprocess::binarize(&blurred, config.board_threshold, false);
    preprocess::external_contour_rects(&binary)
}

/// Select the board from a list of candidate rectangles.
///
/// Maximum-area candidate whose aspect ratio lies strictly inside the
/// configured window. The strict `area > max_area` comparison means an
/// exact-area tie keeps the earliest candidate in input order, and a
/// candidate failing the aspect window never displaces the current
/// best even when larger. Returns `None` when no candidate passes.
#[must_use]
pub fn select_board(candidates: &[Rect], config: &PipelineConfig) -> Option<Rect> {
    let mut max_area = 0u64;
    let mut best = None;

    for &candidate in candidates {
        let area = candidate.area();
        let aspect = candidate.aspect();
        if area > max_area
            && aspect > config.min_board_aspect
            && aspect < config.max_board_aspect
        {
            best = Some(candidate);
            max_area = area;
        }
    }

    best
}

//! Defect localization inside the board region of interest.
//!
//! Dark blemishes (knots, cracks, stains) on the bright board surface
//! become foreground under an inverted threshold; a morphological
//! opening removes sub-kernel speckle before contour extraction.

use image::GrayImage;

use crate::preprocess;
use crate::types::{PipelineConfig, Rect};

/// Locate defect candidate rectangles inside the board.
///
/// Crops `gray` to the board ROI, then runs blur -> inverted binary
/// threshold -> morphological opening -> external-contour bounding
/// rectangles. A rectangle is kept only when its width and height both
/// strictly exceed `min_defect_size` and its area is strictly below
/// `max_defect_area_ratio` of the board area, which discards noise
/// slivers and board-scale shadows alike.
///
/// Returned rectangles are translated into full-frame coordinates.
/// No count cap; contour-extraction order is preserved (not sorted).
#[must_use = "returns the defect rectangles in full-frame coordinates"]
pub fn locate_defects(gray: &GrayImage, board: Rect, config: &PipelineConfig) -> Vec<Rect> {
    let roi = preprocess::crop(gray, board);
    let blurred = preprocess::blur(&roi, config.blur_sigma);
    let binary = preprocess::binarize(&blurred, config.defect_threshold, true);
    let denoised = preprocess::denoise_open(&binary, config.morph_radius);

    let max_area = config.max_defect_area_ratio * board.area() as f64;

    preprocess::external_contour_rects(&denoised)
        .into_iter()
        .filter(|r| {
            r.width > config.min_defect_size
                && r.height > config.min_defect_size
                && (r.area() as f64) < max_area
        })
        .map(|r| r.translate(board.x, board.y))
        .collect()
}

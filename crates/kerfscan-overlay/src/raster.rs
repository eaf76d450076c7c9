//! Raster overlay: draw one tick's output onto an RGBA frame.
//!
//! Hollow rectangles via `imageproc::drawing`, thickened by nesting,
//! in the same palette as the SVG serializer. Useful for writing
//! annotated stills from a replay without an SVG compositor. Text
//! labels are the SVG serializer's department -- rasterizing type
//! would pull in a font stack for no pipeline benefit.

use image::Rgba;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;

use kerfscan_pipeline::{Rect, RgbaImage, TickOutput};

/// Board outline pixels (green, opaque).
const BOARD_RGBA: Rgba<u8> = Rgba([0x33, 0xcc, 0x33, 0xff]);
/// Defect box pixels (red, opaque).
const DEFECT_RGBA: Rgba<u8> = Rgba([0xff, 0x33, 0x33, 0xff]);
/// Cutting segment pixels (blue, opaque).
const CUTTING_RGBA: Rgba<u8> = Rgba([0x33, 0x99, 0xff, 0xff]);

/// Stroke thickness in pixels.
const STROKE: u32 = 3;

/// Draw the tick output onto `frame` in place.
///
/// Cutting segments first, then the board, then defects, so defect
/// boxes stay visible where regions touch. Rectangles partially
/// outside the frame are clipped by the drawing routine.
pub fn draw_overlay(frame: &mut RgbaImage, output: &TickOutput) {
    for segment in &output.cuttings {
        stroke_rect(frame, *segment, CUTTING_RGBA);
    }
    if let Some(board) = output.board {
        stroke_rect(frame, board, BOARD_RGBA);
    }
    for defect in &output.defects {
        stroke_rect(frame, *defect, DEFECT_RGBA);
    }
}

/// Draw a rectangle outline `STROKE` pixels thick by nesting
/// one-pixel hollow rectangles inward.
fn stroke_rect(frame: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    for inset in 0..STROKE {
        if rect.width <= 2 * inset || rect.height <= 2 * inset {
            break;
        }
        #[allow(clippy::cast_possible_wrap)]
        let drawn = DrawRect::at((rect.x + inset) as i32, (rect.y + inset) as i32)
            .of_size(rect.width - 2 * inset, rect.height - 2 * inset);
        draw_hollow_rect_mut(frame, drawn, color);
    }
}

//! SVG overlay serializer.
//!
//! Converts one tick's output into an SVG document sized to the frame,
//! using the [`svg`] crate for document construction and XML escaping:
//! the board outline in one color, each defect box in a second color
//! with a positional label, and each cutting segment in a third.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::{Rectangle, Text};

use kerfscan_pipeline::{Dimensions, Rect, TickOutput};

use crate::{BOARD_COLOR, CUTTING_COLOR, DEFECT_COLOR};

/// Stroke width for overlay rectangles, matching the 4px canvas
/// stroke of the live renderer.
const STROKE_WIDTH: u32 = 4;
/// Label font size in pixels.
const LABEL_SIZE: u32 = 16;

/// Serialize one tick's output as an SVG overlay.
///
/// The `viewBox` matches the frame dimensions, so the overlay aligns
/// with the frame when composited at any display size. Defect labels
/// are positional (`defect 1`, `defect 2`, ...) in current-tick
/// detection order; an external classifier can substitute its own
/// names by index.
#[must_use]
pub fn to_svg(output: &TickOutput, dimensions: Dimensions) -> String {
    let mut doc = Document::new()
        .set("xmlns", "http://www.w3.org/2000/svg")
        .set(
            "viewBox",
            format!("0 0 {} {}", dimensions.width, dimensions.height),
        );

    for segment in &output.cuttings {
        doc = doc.add(outline(*segment, CUTTING_COLOR));
    }

    if let Some(board) = output.board {
        doc = doc.add(outline(board, BOARD_COLOR));
    }

    for (index, defect) in output.defects.iter().enumerate() {
        doc = doc.add(outline(*defect, DEFECT_COLOR));
        let label = Text::new(format!("defect {}", index + 1))
            .set("x", defect.x)
            .set("y", defect.y.saturating_sub(6))
            .set("fill", DEFECT_COLOR)
            .set("font-size", LABEL_SIZE);
        doc = doc.add(label);
    }

    doc.to_string()
}

/// A stroked, unfilled rectangle element.
fn outline(rect: Rect, color: &str) -> Rectangle {
    Rectangle::new()
        .set("x", rect.x)
        .set("y", rect.y)
        .set("width", rect.width)
        .set("height", rect.height)
        .set("fill", "none")
        .set("stroke", color)
        .set("stroke-width", STROKE_WIDTH)
}

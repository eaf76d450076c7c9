//! kerfscan-overlay: pure serializers for per-tick render plans.
//!
//! Turns a [`kerfscan_pipeline::TickOutput`] into something a renderer
//! can present: an SVG overlay document or rectangles drawn directly
//! onto an RGBA frame. No I/O -- strings and pixel buffers in and out.

pub mod raster;
pub mod svg;

pub use raster::draw_overlay;
pub use svg::to_svg;

/// Board outline color.
pub const BOARD_COLOR: &str = "#33cc33";
/// Defect box and label color.
pub const DEFECT_COLOR: &str = "#ff3333";
/// Cutting segment color.
pub const CUTTING_COLOR: &str = "#3399ff";

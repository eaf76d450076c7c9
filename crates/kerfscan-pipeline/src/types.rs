//! Shared types for the kerfscan analysis pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// frame data without depending on `image` directly.
pub use image::RgbaImage;

/// An axis-aligned rectangle in pixel coordinates.
///
/// The fundamental unit for every detected region: board, defect
/// candidates, stable defects, and cutting segments all use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (pixels from the frame's left edge).
    pub x: u32,
    /// Top edge (pixels from the frame's top edge).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in square pixels.
    ///
    /// Widened to `u64` so `width * height` cannot overflow for any
    /// pair of `u32` dimensions.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Aspect ratio (`width / height`).
    ///
    /// Returns `0.0` for a zero-height rectangle rather than dividing
    /// by zero; such a degenerate rect fails any open aspect window.
    #[must_use]
    pub fn aspect(self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }

    /// One past the right edge (`x + width`).
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom edge (`y + height`).
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// The same rectangle translated by `(dx, dy)`.
    #[must_use]
    pub const fn translate(self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }
}

/// One RGBA8 video frame handed to the pipeline for a single tick.
///
/// The pixel buffer is `width * height * 4` bytes in row-major order.
/// The core only reads it and never retains it past the tick; the
/// frame source owns acquisition and reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw RGBA8 pixel data, row-major.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw RGBA8 buffer as a frame.
    #[must_use]
    pub const fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// The buffer length implied by the frame dimensions.
    #[must_use]
    pub const fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Frame dimensions in pixels.
///
/// Used by overlay serializers to set coordinate spaces
/// (e.g. the SVG `viewBox`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the analysis pipeline.
///
/// All parameters default to the tuned values for bright-board /
/// dark-defect footage. The filter constants (minimum defect size,
/// area ratio, stability tolerance, minimum segment width, board
/// aspect window) are strict comparisons; see each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Gaussian blur sigma applied before both threshold passes.
    /// Non-positive values skip the blur.
    pub blur_sigma: f32,

    /// Global binary threshold cutoff for board localization.
    /// Pixels brighter than this are treated as board material.
    pub board_threshold: u8,

    /// Inverted binary threshold cutoff inside the board ROI.
    /// Pixels darker than this are treated as defect material.
    pub defect_threshold: u8,

    /// Radius of the square morphological-opening kernel that removes
    /// sub-kernel speckle noise from the defect mask. `0` disables
    /// the opening.
    pub morph_radius: u8,

    /// A defect candidate is kept only when both its width and height
    /// strictly exceed this size in pixels.
    pub min_defect_size: u32,

    /// A defect candidate is kept only when its area is strictly less
    /// than this fraction of the board area. Filters out the board
    /// itself (and board-sized shadows) re-detected inside the ROI.
    pub max_defect_area_ratio: f64,

    /// Per-axis positional tolerance for cross-tick stability: a
    /// current box is stable when some previous box lies strictly
    /// within this distance on both axes independently.
    pub stability_tolerance: u32,

    /// A cutting segment is emitted only when its width strictly
    /// exceeds this size in pixels.
    pub min_segment_width: u32,

    /// Lower bound (exclusive) of the accepted board aspect ratio.
    pub min_board_aspect: f64,

    /// Upper bound (exclusive) of the accepted board aspect ratio.
    pub max_board_aspect: f64,
}

impl PipelineConfig {
    /// Default Gaussian blur sigma.
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;
    /// Default global board threshold cutoff.
    pub const DEFAULT_BOARD_THRESHOLD: u8 = 128;
    /// Default inverted defect threshold cutoff.
    pub const DEFAULT_DEFECT_THRESHOLD: u8 = 90;
    /// Default morphological-opening kernel radius.
    pub const DEFAULT_MORPH_RADIUS: u8 = 1;
    /// Default minimum defect width/height (strict).
    pub const DEFAULT_MIN_DEFECT_SIZE: u32 = 30;
    /// Default maximum defect area as a fraction of board area (strict).
    pub const DEFAULT_MAX_DEFECT_AREA_RATIO: f64 = 0.6;
    /// Default per-axis stability tolerance (strict).
    pub const DEFAULT_STABILITY_TOLERANCE: u32 = 15;
    /// Default minimum cutting-segment width (strict).
    pub const DEFAULT_MIN_SEGMENT_WIDTH: u32 = 30;
    /// Default board aspect-ratio window lower bound (exclusive).
    pub const DEFAULT_MIN_BOARD_ASPECT: f64 = 0.2;
    /// Default board aspect-ratio window upper bound (exclusive).
    pub const DEFAULT_MAX_BOARD_ASPECT: f64 = 5.0;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            board_threshold: Self::DEFAULT_BOARD_THRESHOLD,
            defect_threshold: Self::DEFAULT_DEFECT_THRESHOLD,
            morph_radius: Self::DEFAULT_MORPH_RADIUS,
            min_defect_size: Self::DEFAULT_MIN_DEFECT_SIZE,
            max_defect_area_ratio: Self::DEFAULT_MAX_DEFECT_AREA_RATIO,
            stability_tolerance: Self::DEFAULT_STABILITY_TOLERANCE,
            min_segment_width: Self::DEFAULT_MIN_SEGMENT_WIDTH,
            min_board_aspect: Self::DEFAULT_MIN_BOARD_ASPECT,
            max_board_aspect: Self::DEFAULT_MAX_BOARD_ASPECT,
        }
    }
}

/// The only state carried across ticks: the previous tick's defect
/// boxes, in full-frame coordinates.
///
/// `accepted` holds the geometric-filter survivors (pre stability);
/// the current tick's candidates are matched against them to decide
/// stability. Matching against the filtered *output* instead would
/// deadlock from the empty initial state, since nothing could ever
/// become stable. `displayed` holds the stable subset that was
/// actually reported, and is what a board-loss tick re-reports, so a
/// transient box never reaches the renderer.
///
/// Owned exclusively by the tick driver, replaced wholly each tick,
/// never partially mutated. Compared by position (unordered-set
/// semantics) by the stability filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// The previous tick's accepted defect boxes (pre stability).
    pub accepted: Vec<Rect>,
    /// The previous tick's displayed stable defect boxes.
    pub displayed: Vec<Rect>,
}

impl PipelineState {
    /// State for the initial tick: no prior boxes, so every
    /// first-tick candidate is transient.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            accepted: Vec::new(),
            displayed: Vec::new(),
        }
    }
}

/// What the renderer receives for one tick.
///
/// When the board was not found, `board` is `None`, `cuttings` is
/// empty, and `defects` carries the previously displayed stable set
/// (stale-memory contract; see [`crate::stability`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutput {
    /// The detected board, if any. Re-detected independently every
    /// tick; never tracked across frames.
    pub board: Option<Rect>,
    /// Stable defect boxes in full-frame coordinates, in
    /// current-tick detection order.
    pub defects: Vec<Rect>,
    /// Clear cutting segments, disjoint and ordered left to right,
    /// each spanning the board's full height.
    pub cuttings: Vec<Rect>,
}

/// Result of analyzing one frame: the render plan plus the state to
/// thread into the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Per-tick output for the renderer.
    pub output: TickOutput,
    /// Replacement pipeline state for the next tick.
    pub state: PipelineState,
}

/// Errors from analyzing a single frame.
///
/// All variants are tick-local: the driver abandons or refuses the
/// offending tick and scheduling continues. Board loss is not an
/// error; it is the valid `board: None` outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// The frame source yielded a frame with a zero dimension. The
    /// tick is refused and the caller signalled; the pipeline never
    /// silently proceeds on such a frame.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidFrame {
        /// Reported frame width.
        width: u32,
        /// Reported frame height.
        height: u32,
    },

    /// The frame's pixel buffer does not match its dimensions, so the
    /// image-op layer cannot run. The tick is abandoned (no render)
    /// and scheduling continues.
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Byte length implied by the frame dimensions.
        expected: usize,
        /// Actual byte length of the buffer.
        actual: usize,
    },
}

//! Raster primitives for the analysis pipeline.
//!
//! Thin wrappers over `image`/`imageproc`: grayscale conversion,
//! Gaussian blur, binary thresholding, morphological opening,
//! external-contour bounding rectangles, and ROI cropping. All
//! functions are pure over in-memory pixel buffers.

use image::{GrayImage, Luma};
use imageproc::contours::{self, BorderType};
use imageproc::contrast::{self, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::types::{Frame, PipelineError, Rect};

/// Check that a frame's dimensions are non-zero and its buffer length
/// matches them.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFrame`] for a zero dimension and
/// [`PipelineError::BufferSize`] for a mismatched pixel buffer.
pub fn validate_frame(frame: &Frame) -> Result<(), PipelineError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PipelineError::InvalidFrame {
            width: frame.width,
            height: frame.height,
        });
    }
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(PipelineError::BufferSize {
            expected,
            actual: frame.data.len(),
        });
    }
    Ok(())
}

/// Convert an RGBA8 frame to a grayscale image.
///
/// Uses the Rec. 709 luma weighting (`0.2126 R + 0.7152 G + 0.0722 B`),
/// matching `image`'s RGB-to-luma conversion. Alpha is ignored.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFrame`] or
/// [`PipelineError::BufferSize`] when the frame fails validation.
pub fn frame_to_grayscale(frame: &Frame) -> Result<GrayImage, PipelineError> {
    let mut out = GrayImage::new(0, 0);
    grayscale_into(frame, &mut out)?;
    Ok(out)
}

/// Convert an RGBA8 frame to grayscale into a caller-owned buffer.
///
/// Reallocates `out` only when its dimensions differ from the frame's,
/// so a buffer pooled across ticks of a fixed-resolution stream is
/// converted allocation-free.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFrame`] or
/// [`PipelineError::BufferSize`] when the frame fails validation.
pub fn grayscale_into(frame: &Frame, out: &mut GrayImage) -> Result<(), PipelineError> {
    validate_frame(frame)?;

    if out.dimensions() != (frame.width, frame.height) {
        *out = GrayImage::new(frame.width, frame.height);
    }

    for (pixel, rgba) in out.pixels_mut().zip(frame.data.chunks_exact(4)) {
        let luma = 2126 * u32::from(rgba[0]) + 7152 * u32::from(rgba[1]) + 722 * u32::from(rgba[2]);
        #[allow(clippy::cast_possible_truncation)]
        {
            *pixel = Luma([(luma / 10000) as u8]);
        }
    }
    Ok(())
}

/// Apply Gaussian blur to a grayscale image.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Binary-threshold a grayscale image.
///
/// With `invert = false`, pixels strictly above `cutoff` become white;
/// with `invert = true` the polarity flips, turning dark regions
/// (defect material) into foreground.
#[must_use = "returns the binarized image"]
pub fn binarize(image: &GrayImage, cutoff: u8, invert: bool) -> GrayImage {
    let kind = if invert {
        ThresholdType::BinaryInverted
    } else {
        ThresholdType::Binary
    };
    contrast::threshold(image, cutoff, kind)
}

/// Morphological opening with a square kernel of the given radius.
///
/// Erode-then-dilate removes foreground features thinner than
/// `2 * radius + 1` pixels (speckle noise) while preserving the shape
/// of larger blobs. A radius of `0` is a no-op.
#[must_use = "returns the opened image"]
pub fn denoise_open(image: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    morphology::open(image, Norm::LInf, radius)
}

/// Bounding rectangles of the external contours in a binary image.
///
/// Runs Suzuki-Abe border following via
/// `imageproc::contours::find_contours` and keeps only top-level outer
/// borders (the equivalent of external-contour retrieval), one
/// bounding rectangle per contour, in contour-extraction order.
#[must_use = "returns the contour bounding rectangles"]
pub fn external_contour_rects(image: &GrayImage) -> Vec<Rect> {
    let found: Vec<contours::Contour<i32>> = contours::find_contours(image);

    found
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| bounding_rect(&c.points))
        .collect()
}

/// Extract the board region of interest as its own image.
///
/// The caller guarantees `roi` lies within the image bounds (the board
/// rectangle originates from this image's own contours).
#[must_use = "returns the cropped region"]
pub fn crop(image: &GrayImage, roi: Rect) -> GrayImage {
    image::imageops::crop_imm(image, roi.x, roi.y, roi.width, roi.height).to_image()
}

/// Pixel-inclusive bounding rectangle of a set of contour points.
///
/// Returns `None` for an empty point set. Coordinates are clamped at
/// zero; border following never yields negative coordinates, but the
/// contour point type is signed.
fn bounding_rect(points: &[imageproc::point::Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x, first.y);

    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    #[allow(clippy::cast_sign_loss)]
    Some(Rect::new(
        min_x.max(0) as u32,
        min_y.max(0) as u32,
        (max_x - min_x + 1).max(0) as u32,
        (max_y - min_y + 1).max(0) as u32,
    ))
}

//! kerfscan-pipeline: pure per-frame board/defect analysis (sans-IO).
//!
//! Analyzes one video frame per tick through:
//! grayscale -> board localization -> defect localization ->
//! cross-frame stability filtering -> cutting-segment computation.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers and returns structured data. Camera acquisition,
//! on-screen rendering, and remote defect classification live behind
//! the [`driver::FrameSource`] / [`driver::Renderer`] seams.
//!
//! The only cross-tick state is [`PipelineState`]: the previous tick's
//! accepted defect boxes, threaded explicitly as an argument
//! and returned replacement so single ticks are unit-testable without
//! a live scheduler.

pub mod board;
pub mod cutting;
pub mod defect;
pub mod diagnostics;
pub mod driver;
pub mod pool;
pub mod preprocess;
pub mod stability;
pub mod tick;
pub mod types;

pub use driver::{FrameSource, Renderer, StepError, TickDriver, TickStatus};
pub use types::{
    Dimensions, Frame, GrayImage, PipelineConfig, PipelineError, PipelineState, Rect, RgbaImage,
    TickOutput, TickResult,
};

/// Analyze one frame: the full per-tick pipeline in a single call.
///
/// # Pipeline steps
///
/// 1. Validate the frame and convert to grayscale
/// 2. Global threshold + external contours -> board candidates
/// 3. Board selection (maximum area within the aspect window)
/// 4. Defect localization inside the board ROI
/// 5. Stability filtering against the previous tick's accepted set
/// 6. Cutting-segment sweep between the stable defects
///
/// Board loss is not an error: when no candidate passes the aspect
/// filter, steps 4-6 are skipped, the previous [`PipelineState`] is
/// retained unchanged (stale memory persists until the board is next
/// detected), and the output reports `board: None` with the previously
/// displayed stable set and no cutting segments.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidFrame`] for a zero-dimension frame
/// and [`PipelineError::BufferSize`] when the pixel buffer does not
/// match the frame dimensions. Both are tick-local.
pub fn analyze_frame(
    frame: &Frame,
    state: &PipelineState,
    config: &PipelineConfig,
) -> Result<TickResult, PipelineError> {
    // 1. Validate and convert to grayscale.
    let gray = preprocess::frame_to_grayscale(frame)?;
    Ok(analyze_gray(&gray, state, config))
}

/// Analyze an already-grayscaled frame.
///
/// The infallible tail of [`analyze_frame`], split out so the tick
/// driver can feed it a pooled grayscale buffer.
#[must_use = "returns the tick output and the replacement state"]
pub fn analyze_gray(
    gray: &GrayImage,
    state: &PipelineState,
    config: &PipelineConfig,
) -> TickResult {
    // 2+3. Board localization.
    let candidates = board::board_candidates(gray, config);
    let Some(found) = board::select_board(&candidates, config) else {
        // Board lost: skip defect/stability/cutting for this tick and
        // keep the previous state unchanged.
        return TickResult {
            output: TickOutput {
                board: None,
                defects: state.displayed.clone(),
                cuttings: Vec::new(),
            },
            state: state.clone(),
        };
    };

    // 4. Defect localization inside the ROI.
    let raw = defect::locate_defects(gray, found, config);

    // 5. Stability filtering against the previous tick's accepted set.
    let stable = stability::filter_stable(&raw, &state.accepted, config.stability_tolerance);

    // 6. Cutting segments between the stable defects.
    let cuttings = cutting::cutting_segments(found, &stable, config.min_segment_width);

    TickResult {
        output: TickOutput {
            board: Some(found),
            defects: stable.clone(),
            cuttings,
        },
        state: PipelineState {
            accepted: raw,
            displayed: stable,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// RGBA frame with a bright board and dark defect squares
    /// (board-relative coordinates).
    fn synthetic_frame(board: Rect, defects: &[Rect]) -> Frame {
        let (width, height) = (640, 480);
        let mut data = vec![0u8; (width * height * 4) as usize];
        for y in 0..height {
            for x in 0..width {
                let on_board = x >= board.x && x < board.right() && y >= board.y && y < board.bottom();
                let mut value = if on_board { 200 } else { 30 };
                if on_board {
                    for d in defects {
                        let dx = board.x + d.x;
                        let dy = board.y + d.y;
                        if x >= dx && x < dx + d.width && y >= dy && y < dy + d.height {
                            value = 20;
                        }
                    }
                }
                let i = ((y * width + x) * 4) as usize;
                data[i..i + 3].copy_from_slice(&[value, value, value]);
                data[i + 3] = 255;
            }
        }
        Frame::new(width, height, data)
    }

    #[test]
    fn zero_dimension_frame_is_refused() {
        let frame = Frame::new(0, 0, Vec::new());
        let result = analyze_frame(&frame, &PipelineState::empty(), &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(PipelineError::InvalidFrame { width: 0, height: 0 })
        ));
    }

    #[test]
    fn first_tick_reports_board_but_no_defects() {
        let board = Rect::new(50, 50, 500, 300);
        let frame = synthetic_frame(board, &[Rect::new(100, 60, 40, 40)]);
        let result =
            analyze_frame(&frame, &PipelineState::empty(), &PipelineConfig::default()).unwrap();
        assert!(result.output.board.is_some());
        // One tick of latency: the candidate is unstable on tick one
        // but enters the state for the next tick to confirm.
        assert!(result.output.defects.is_empty());
        assert_eq!(result.state.accepted.len(), 1);
        assert!(result.state.displayed.is_empty());
        // The whole board is one clear segment.
        assert_eq!(result.output.cuttings.len(), 1);
    }

    #[test]
    fn second_tick_confirms_the_defect() {
        let board = Rect::new(50, 50, 500, 300);
        let frame = synthetic_frame(board, &[Rect::new(100, 60, 40, 40)]);
        let config = PipelineConfig::default();

        let tick1 = analyze_frame(&frame, &PipelineState::empty(), &config).unwrap();
        let tick2 = analyze_frame(&frame, &tick1.state, &config).unwrap();
        assert_eq!(tick2.output.defects.len(), 1);
        assert_eq!(tick2.state.accepted.len(), 1);
        assert_eq!(tick2.state.displayed, tick2.output.defects);
        // Clear spans on either side of the confirmed defect.
        assert!(tick2.output.cuttings.len() >= 2);
    }

    #[test]
    fn jumping_defect_never_stabilizes() {
        let board = Rect::new(50, 50, 500, 300);
        let config = PipelineConfig::default();
        let tick1 = analyze_frame(
            &synthetic_frame(board, &[Rect::new(100, 60, 40, 40)]),
            &PipelineState::empty(),
            &config,
        )
        .unwrap();
        // Same defect, but displaced far beyond the tolerance.
        let tick2 = analyze_frame(
            &synthetic_frame(board, &[Rect::new(300, 150, 40, 40)]),
            &tick1.state,
            &config,
        )
        .unwrap();
        assert!(tick2.output.defects.is_empty());
    }

    #[test]
    fn board_loss_retains_previous_state() {
        let config = PipelineConfig::default();
        let retained = PipelineState {
            accepted: vec![Rect::new(140, 100, 40, 40), Rect::new(300, 150, 40, 40)],
            displayed: vec![Rect::new(140, 100, 40, 40)],
        };
        // All-dark frame: no board candidate survives.
        let dark = Frame::new(64, 48, {
            let mut d = vec![10u8; 64 * 48 * 4];
            d.iter_mut().skip(3).step_by(4).for_each(|a| *a = 255);
            d
        });
        let result = analyze_frame(&dark, &retained, &config).unwrap();
        assert_eq!(result.output.board, None);
        // Stale-memory contract: the output defect list equals the
        // displayed set, and the state is unchanged.
        assert_eq!(result.output.defects, retained.displayed);
        assert_eq!(result.state, retained);
        assert!(result.output.cuttings.is_empty());
    }

    #[test]
    fn board_loss_does_not_leak_transient_boxes() {
        let config = PipelineConfig::default();
        let steady = Rect::new(100, 60, 40, 40);
        let newcomer = Rect::new(300, 150, 40, 40);

        // Tick 1 sees one defect; tick 2 sees it plus a newcomer, so
        // only the steady one is displayed.
        let tick1 = analyze_frame(
            &synthetic_frame(Rect::new(50, 50, 500, 300), &[steady]),
            &PipelineState::empty(),
            &config,
        )
        .unwrap();
        let tick2 = analyze_frame(
            &synthetic_frame(Rect::new(50, 50, 500, 300), &[steady, newcomer]),
            &tick1.state,
            &config,
        )
        .unwrap();
        assert_eq!(tick2.output.defects.len(), 1);
        assert_eq!(tick2.state.accepted.len(), 2);

        // Tick 3 loses the board: the output must be exactly what was
        // displayed on tick 2, never the wider accepted set.
        let dark = Frame::new(64, 48, {
            let mut d = vec![10u8; 64 * 48 * 4];
            d.iter_mut().skip(3).step_by(4).for_each(|a| *a = 255);
            d
        });
        let tick3 = analyze_frame(&dark, &tick2.state, &config).unwrap();
        assert_eq!(tick3.output.defects, tick2.output.defects);
    }
}

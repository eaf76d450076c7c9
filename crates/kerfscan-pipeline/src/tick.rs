//! Incremental tick: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::analyze_frame`] which runs the whole tick in one
//! call, [`Pending`] lets the caller drive execution one stage at a
//! time:
//!
//! ```rust
//! # use kerfscan_pipeline::tick::{BoardOutcome, Pending};
//! # use kerfscan_pipeline::{Frame, PipelineConfig, PipelineError, PipelineState};
//! # fn run(frame: Frame) -> Result<(), PipelineError> {
//! let pending = Pending::new(frame, PipelineState::empty(), PipelineConfig::default());
//! let completed = match pending.preprocess()?.locate_board() {
//!     BoardOutcome::Found(found) => found.locate_defects().stabilize().segment(),
//!     BoardOutcome::Lost(lost) => lost,
//! };
//! let (result, staged) = completed.into_result();
//! # let _ = (result, staged);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next stage,
//! carrying the previously computed intermediates; accessors expose
//! the current stage's output. [`Completed::into_result`] yields both
//! the [`TickResult`] and a [`StagedTick`] with every intermediate for
//! visualization and tuning. Semantics are identical to
//! [`crate::analyze_frame`], including the board-loss contract.

use image::GrayImage;

use crate::types::{
    Frame, PipelineConfig, PipelineError, PipelineState, Rect, TickOutput, TickResult,
};
use crate::{board, cutting, defect, preprocess, stability};

/// All intermediates of one tick, for inspection after completion.
///
/// Stages skipped on board loss are `None`.
#[derive(Debug, Clone)]
pub struct StagedTick {
    /// Stage 1: grayscale frame.
    pub grayscale: GrayImage,
    /// Stage 2: board candidate rectangles, in contour order.
    pub board_candidates: Vec<Rect>,
    /// Stage 4: defect rectangles before stability filtering
    /// (`None` on board loss).
    pub raw_defects: Option<Vec<Rect>>,
    /// Stage 5: stable defect rectangles (`None` on board loss).
    pub stable_defects: Option<Vec<Rect>>,
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Tick state before any processing has occurred.
#[must_use = "tick stages are consumed by advancing: call .preprocess() to continue"]
pub struct Pending {
    config: PipelineConfig,
    state: PipelineState,
    frame: Frame,
}

impl Pending {
    /// Begin a tick over one frame with the previous tick's state.
    pub const fn new(frame: Frame, state: PipelineState, config: PipelineConfig) -> Self {
        Self {
            config,
            state,
            frame,
        }
    }

    /// The frame under analysis.
    #[must_use]
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Validate the frame, convert to grayscale, and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFrame`] or
    /// [`PipelineError::BufferSize`] when the frame fails validation.
    pub fn preprocess(self) -> Result<Preprocessed, PipelineError> {
        let grayscale = preprocess::frame_to_grayscale(&self.frame)?;
        Ok(Preprocessed {
            config: self.config,
            state: self.state,
            grayscale,
        })
    }
}

// ─────────────────────── Stage 1: Preprocessed ───────────────────────

/// Tick state after grayscale conversion.
#[must_use = "tick stages are consumed by advancing: call .locate_board() to continue"]
pub struct Preprocessed {
    config: PipelineConfig,
    state: PipelineState,
    grayscale: GrayImage,
}

impl Preprocessed {
    /// The grayscale frame.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// Run board localization and branch on the outcome.
    ///
    /// On board loss the tick completes immediately: the previous
    /// state is retained unchanged and the output carries the
    /// previously displayed stable set with no cutting segments.
    pub fn locate_board(self) -> BoardOutcome {
        let candidates = board::board_candidates(&self.grayscale, &self.config);
        match board::select_board(&candidates, &self.config) {
            Some(found) => BoardOutcome::Found(BoardFound {
                config: self.config,
                state: self.state,
                grayscale: self.grayscale,
                candidates,
                board: found,
            }),
            None => BoardOutcome::Lost(Completed {
                result: TickResult {
                    output: TickOutput {
                        board: None,
                        defects: self.state.displayed.clone(),
                        cuttings: Vec::new(),
                    },
                    state: self.state,
                },
                staged: StagedTick {
                    grayscale: self.grayscale,
                    board_candidates: candidates,
                    raw_defects: None,
                    stable_defects: None,
                },
            }),
        }
    }
}

/// Result of the board-localization stage.
///
/// [`Found`](Self::Found) continues through defect analysis;
/// [`Lost`](Self::Lost) short-circuits to a completed tick. Neither
/// outcome is sticky: the
/// next tick re-evaluates board localization independently.
#[must_use = "both outcomes carry the tick: match and continue or finish"]
pub enum BoardOutcome {
    /// A board passed the aspect/area selection.
    Found(BoardFound),
    /// No candidate passed; the tick is already complete.
    Lost(Completed),
}

// ──────────────────────── Stage 2: BoardFound ────────────────────────

/// Tick state after a board was selected.
#[must_use = "tick stages are consumed by advancing: call .locate_defects() to continue"]
pub struct BoardFound {
    config: PipelineConfig,
    state: PipelineState,
    grayscale: GrayImage,
    candidates: Vec<Rect>,
    board: Rect,
}

impl BoardFound {
    /// The selected board rectangle.
    #[must_use]
    pub const fn board(&self) -> Rect {
        self.board
    }

    /// The candidate rectangles board selection chose from.
    #[must_use]
    pub fn candidates(&self) -> &[Rect] {
        &self.candidates
    }

    /// Locate defect candidates inside the board ROI and advance.
    pub fn locate_defects(self) -> DefectsLocated {
        let raw = defect::locate_defects(&self.grayscale, self.board, &self.config);
        DefectsLocated {
            config: self.config,
            state: self.state,
            grayscale: self.grayscale,
            candidates: self.candidates,
            board: self.board,
            raw,
        }
    }
}

// ────────────────────── Stage 3: DefectsLocated ──────────────────────

/// Tick state after defect localization, before stability filtering.
#[must_use = "tick stages are consumed by advancing: call .stabilize() to continue"]
pub struct DefectsLocated {
    config: PipelineConfig,
    state: PipelineState,
    grayscale: GrayImage,
    candidates: Vec<Rect>,
    board: Rect,
    raw: Vec<Rect>,
}

impl DefectsLocated {
    /// Defect rectangles before stability filtering, full-frame
    /// coordinates, contour order.
    #[must_use]
    pub fn raw_defects(&self) -> &[Rect] {
        &self.raw
    }

    /// Filter against the previous tick's accepted set and advance.
    pub fn stabilize(self) -> Stabilized {
        let stable =
            stability::filter_stable(&self.raw, &self.state.accepted, self.config.stability_tolerance);
        Stabilized {
            config: self.config,
            grayscale: self.grayscale,
            candidates: self.candidates,
            board: self.board,
            raw: self.raw,
            stable,
        }
    }
}

// ──────────────────────── Stage 4: Stabilized ────────────────────────

/// Tick state after stability filtering.
#[must_use = "tick stages are consumed by advancing: call .segment() to continue"]
pub struct Stabilized {
    config: PipelineConfig,
    grayscale: GrayImage,
    candidates: Vec<Rect>,
    board: Rect,
    raw: Vec<Rect>,
    stable: Vec<Rect>,
}

impl Stabilized {
    /// The confirmed stable defect boxes.
    #[must_use]
    pub fn stable(&self) -> &[Rect] {
        &self.stable
    }

    /// Compute cutting segments and complete the tick.
    pub fn segment(self) -> Completed {
        let cuttings =
            cutting::cutting_segments(self.board, &self.stable, self.config.min_segment_width);
        Completed {
            result: TickResult {
                output: TickOutput {
                    board: Some(self.board),
                    defects: self.stable.clone(),
                    cuttings,
                },
                state: PipelineState {
                    accepted: self.raw.clone(),
                    displayed: self.stable.clone(),
                },
            },
            staged: StagedTick {
                grayscale: self.grayscale,
                board_candidates: self.candidates,
                raw_defects: Some(self.raw),
                stable_defects: Some(self.stable),
            },
        }
    }
}

// ───────────────────────── Stage 5: Completed ────────────────────────

/// A finished tick, reached from either board outcome.
#[must_use = "call .into_result() to take the tick output"]
pub struct Completed {
    result: TickResult,
    staged: StagedTick,
}

impl Completed {
    /// The tick result, for callers not interested in intermediates.
    #[must_use]
    pub const fn result(&self) -> &TickResult {
        &self.result
    }

    /// Consume the tick, yielding the result and all intermediates.
    #[must_use]
    pub fn into_result(self) -> (TickResult, StagedTick) {
        (self.result, self.staged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn board_frame() -> Frame {
        let (width, height) = (160u32, 120u32);
        let mut data = vec![0u8; (width * height * 4) as usize];
        for y in 0..height {
            for x in 0..width {
                let value = if (20..140).contains(&x) && (20..100).contains(&y) {
                    200
                } else {
                    30
                };
                let i = ((y * width + x) * 4) as usize;
                data[i..i + 3].copy_from_slice(&[value, value, value]);
                data[i + 3] = 255;
            }
        }
        Frame::new(width, height, data)
    }

    fn dark_frame() -> Frame {
        let mut data = vec![10u8; 64 * 48 * 4];
        data.iter_mut().skip(3).step_by(4).for_each(|a| *a = 255);
        Frame::new(64, 48, data)
    }

    fn run_staged(frame: Frame, state: PipelineState) -> (TickResult, StagedTick) {
        let pending = Pending::new(frame, state, PipelineConfig::default());
        let completed = match pending.preprocess().unwrap().locate_board() {
            BoardOutcome::Found(found) => found.locate_defects().stabilize().segment(),
            BoardOutcome::Lost(lost) => lost,
        };
        completed.into_result()
    }

    #[test]
    fn staged_tick_matches_one_shot_analysis() {
        let frame = board_frame();
        let expected = crate::analyze_frame(
            &frame,
            &PipelineState::empty(),
            &PipelineConfig::default(),
        )
        .unwrap();
        let (result, staged) = run_staged(frame, PipelineState::empty());
        assert_eq!(result, expected);
        assert!(staged.raw_defects.is_some());
        assert!(!staged.board_candidates.is_empty());
    }

    #[test]
    fn lost_board_completes_early_with_retained_state() {
        let state = PipelineState {
            accepted: vec![Rect::new(30, 30, 40, 40), Rect::new(80, 60, 40, 40)],
            displayed: vec![Rect::new(30, 30, 40, 40)],
        };
        let (result, staged) = run_staged(dark_frame(), state.clone());
        assert_eq!(result.output.board, None);
        assert_eq!(result.output.defects, state.displayed);
        assert_eq!(result.state, state);
        assert!(staged.raw_defects.is_none());
        assert!(staged.stable_defects.is_none());
    }

    #[test]
    fn invalid_frame_fails_preprocess() {
        let pending = Pending::new(
            Frame::new(8, 8, vec![0; 3]),
            PipelineState::empty(),
            PipelineConfig::default(),
        );
        assert!(matches!(
            pending.preprocess(),
            Err(PipelineError::BufferSize { .. })
        ));
    }

    #[test]
    fn accessors_expose_stage_outputs() {
        let pending = Pending::new(
            board_frame(),
            PipelineState::empty(),
            PipelineConfig::default(),
        );
        assert_eq!(pending.frame().width, 160);
        let preprocessed = pending.preprocess().unwrap();
        assert_eq!(preprocessed.grayscale().dimensions(), (160, 120));
        let BoardOutcome::Found(found) = preprocessed.locate_board() else {
            panic!("expected a board in the synthetic frame");
        };
        assert!(!found.candidates().is_empty());
        assert!(found.board().width > 100);
        let located = found.locate_defects();
        assert!(located.raw_defects().is_empty());
        let stabilized = located.stabilize();
        assert!(stabilized.stable().is_empty());
        let completed = stabilized.segment();
        assert!(completed.result().output.board.is_some());
    }
}

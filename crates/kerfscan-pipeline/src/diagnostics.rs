//! Per-tick diagnostics: timing and counts for each pipeline stage.
//!
//! Permanent instrumentation for threshold tuning and performance
//! work. [`analyze_frame_timed`] runs the same pipeline as
//! [`crate::analyze_frame`] while measuring each stage with
//! [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since [`std::time::Duration`] does not implement
//! serde traits.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::{Frame, PipelineConfig, PipelineError, PipelineState, TickOutput, TickResult};
use crate::{board, cutting, defect, preprocess, stability};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single tick.
///
/// Stages skipped on board loss have `Option` fields set to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickDiagnostics {
    /// Stage 1: validation + grayscale conversion.
    pub preprocess: StageDiagnostics,
    /// Stages 2+3: board candidate extraction and selection.
    pub board_localization: StageDiagnostics,
    /// Stage 4: defect localization (skipped on board loss).
    pub defect_localization: Option<StageDiagnostics>,
    /// Stage 5: stability filtering (skipped on board loss).
    pub stability: Option<StageDiagnostics>,
    /// Stage 6: cutting-segment sweep (skipped on board loss).
    pub cutting: Option<StageDiagnostics>,
    /// Total wall-clock duration of the tick (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts for the tick.
    pub summary: TickSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Grayscale conversion metrics.
    Preprocess {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },
    /// Board localization metrics.
    BoardLocalization {
        /// Number of candidate contour rectangles considered.
        candidate_count: usize,
        /// Whether a board passed the aspect/area selection.
        board_found: bool,
    },
    /// Defect localization metrics.
    DefectLocalization {
        /// Defect rectangles surviving the size/area filter.
        raw_count: usize,
    },
    /// Stability filtering metrics.
    Stability {
        /// Accepted boxes carried in from the previous tick.
        previous_count: usize,
        /// Current candidates confirmed stable.
        stable_count: usize,
    },
    /// Cutting-segment metrics.
    Cutting {
        /// Segments emitted by the sweep.
        segment_count: usize,
    },
}

/// Summary counts across the whole tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSummary {
    /// Whether the board was found this tick.
    pub board_found: bool,
    /// Stable defect boxes reported to the renderer.
    pub stable_defect_count: usize,
    /// Cutting segments reported to the renderer.
    pub cutting_segment_count: usize,
}

/// Run one tick with per-stage timing.
///
/// Semantically identical to [`crate::analyze_frame`]; the board-loss
/// contract (skipped stages, retained state) holds here too, with the
/// skipped stages reported as `None`.
///
/// # Errors
///
/// Same as [`crate::analyze_frame`].
pub fn analyze_frame_timed(
    frame: &Frame,
    state: &PipelineState,
    config: &PipelineConfig,
) -> Result<(TickResult, TickDiagnostics), PipelineError> {
    let tick_start = Instant::now();

    let stage_start = Instant::now();
    let gray = preprocess::frame_to_grayscale(frame)?;
    let preprocess_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Preprocess {
            width: frame.width,
            height: frame.height,
        },
    };

    let stage_start = Instant::now();
    let candidates = board::board_candidates(&gray, config);
    let selected = board::select_board(&candidates, config);
    let board_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::BoardLocalization {
            candidate_count: candidates.len(),
            board_found: selected.is_some(),
        },
    };

    let Some(found) = selected else {
        let result = TickResult {
            output: TickOutput {
                board: None,
                defects: state.displayed.clone(),
                cuttings: Vec::new(),
            },
            state: state.clone(),
        };
        let diagnostics = TickDiagnostics {
            preprocess: preprocess_diag,
            board_localization: board_diag,
            defect_localization: None,
            stability: None,
            cutting: None,
            total_duration: tick_start.elapsed(),
            summary: TickSummary {
                board_found: false,
                stable_defect_count: result.output.defects.len(),
                cutting_segment_count: 0,
            },
        };
        return Ok((result, diagnostics));
    };

    let stage_start = Instant::now();
    let raw = defect::locate_defects(&gray, found, config);
    let defect_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::DefectLocalization {
            raw_count: raw.len(),
        },
    };

    let stage_start = Instant::now();
    let stable = stability::filter_stable(&raw, &state.accepted, config.stability_tolerance);
    let stability_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Stability {
            previous_count: state.accepted.len(),
            stable_count: stable.len(),
        },
    };

    let stage_start = Instant::now();
    let cuttings = cutting::cutting_segments(found, &stable, config.min_segment_width);
    let cutting_diag = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Cutting {
            segment_count: cuttings.len(),
        },
    };

    let summary = TickSummary {
        board_found: true,
        stable_defect_count: stable.len(),
        cutting_segment_count: cuttings.len(),
    };
    let result = TickResult {
        output: TickOutput {
            board: Some(found),
            defects: stable.clone(),
            cuttings,
        },
        state: PipelineState {
            accepted: raw,
            displayed: stable,
        },
    };
    let diagnostics = TickDiagnostics {
        preprocess: preprocess_diag,
        board_localization: board_diag,
        defect_localization: Some(defect_diag),
        stability: Some(stability_diag),
        cutting: Some(cutting_diag),
        total_duration: tick_start.elapsed(),
        summary,
    };
    Ok((result, diagnostics))
}

//! kerfscan-bench: replay a frame sequence through the analysis
//! pipeline with per-tick diagnostics.
//!
//! Takes an ordered list of frame images (the tick order is the
//! argument order), threads the pipeline state across ticks exactly as
//! the live driver does, and prints per-tick board/defect/segment
//! counts and stage timings. Useful for:
//!
//! - Tuning thresholds against recorded footage
//! - Checking how many ticks a defect needs to stabilize
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin kerfscan-bench -- [OPTIONS] <FRAMES>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use kerfscan_pipeline::diagnostics::{TickDiagnostics, analyze_frame_timed};
use kerfscan_pipeline::{Dimensions, Frame, PipelineConfig, PipelineState};

/// Frame-sequence replay and diagnostics for kerfscan.
///
/// Replays the given frame images through the analysis pipeline in
/// argument order, threading stability state across ticks, and prints
/// per-tick timing and count diagnostics.
#[derive(Parser)]
#[command(name = "kerfscan-bench", version)]
struct Cli {
    /// Paths to the frame images, in tick order (PNG, JPEG, BMP, WebP).
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Gaussian blur sigma.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BLUR_SIGMA)]
    blur_sigma: f32,

    /// Global binary threshold cutoff for board localization.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BOARD_THRESHOLD)]
    board_threshold: u8,

    /// Inverted binary threshold cutoff for defect localization.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_DEFECT_THRESHOLD)]
    defect_threshold: u8,

    /// Morphological-opening kernel radius (0 disables).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MORPH_RADIUS)]
    morph_radius: u8,

    /// Minimum defect width/height in pixels (strict).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_DEFECT_SIZE)]
    min_defect_size: u32,

    /// Maximum defect area as a fraction of board area (strict).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_DEFECT_AREA_RATIO)]
    max_defect_area_ratio: f64,

    /// Per-axis stability tolerance in pixels (strict).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_STABILITY_TOLERANCE)]
    stability_tolerance: u32,

    /// Minimum cutting-segment width in pixels (strict).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_SEGMENT_WIDTH)]
    min_segment_width: u32,

    /// Board aspect-ratio window lower bound (exclusive).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_BOARD_ASPECT)]
    min_board_aspect: f64,

    /// Board aspect-ratio window upper bound (exclusive).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MAX_BOARD_ASPECT)]
    max_board_aspect: f64,

    /// Write one overlay SVG per tick into this directory.
    #[arg(long)]
    svg_dir: Option<PathBuf>,

    /// Output diagnostics as JSON (one object per tick) instead of a
    /// human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        blur_sigma: cli.blur_sigma,
        board_threshold: cli.board_threshold,
        defect_threshold: cli.defect_threshold,
        morph_radius: cli.morph_radius,
        min_defect_size: cli.min_defect_size,
        max_defect_area_ratio: cli.max_defect_area_ratio,
        stability_tolerance: cli.stability_tolerance,
        min_segment_width: cli.min_segment_width,
        min_board_aspect: cli.min_board_aspect,
        max_board_aspect: cli.max_board_aspect,
    })
}

/// Load one frame image as an RGBA frame.
fn load_frame(path: &Path) -> Result<Frame, String> {
    let decoded = image::open(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let rgba = decoded.to_rgba8();
    Ok(Frame::new(rgba.width(), rgba.height(), rgba.into_raw()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref dir) = cli.svg_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("Error creating {}: {e}", dir.display());
        return ExitCode::FAILURE;
    }

    eprintln!("Frames: {}", cli.frames.len());
    eprintln!("Config: {config:#?}");
    eprintln!();

    let mut state = PipelineState::empty();
    let mut all_diagnostics = Vec::with_capacity(cli.frames.len());

    for (tick, path) in cli.frames.iter().enumerate() {
        let frame = match load_frame(path) {
            Ok(f) => f,
            Err(msg) => {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
        };
        let dimensions = Dimensions {
            width: frame.width,
            height: frame.height,
        };

        let (result, diagnostics) = match analyze_frame_timed(&frame, &state, &config) {
            Ok(pair) => pair,
            Err(e) => {
                // Tick-local failure: report and continue with the
                // next frame, as the live driver would.
                eprintln!("Tick {tick}: frame abandoned: {e}");
                continue;
            }
        };
        state = result.state;

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            print_tick_report(tick, path, &diagnostics);
        }

        if let Some(ref dir) = cli.svg_dir {
            let svg = kerfscan_overlay::to_svg(&result.output, dimensions);
            let out_path = dir.join(format!("tick-{tick:04}.svg"));
            match std::fs::write(&out_path, &svg) {
                Ok(()) => eprintln!(
                    "Overlay written to {} ({} bytes)",
                    out_path.display(),
                    svg.len(),
                ),
                Err(e) => eprintln!("Error writing {}: {e}", out_path.display()),
            }
        }

        all_diagnostics.push(diagnostics);
    }

    if all_diagnostics.len() > 1 {
        print_sequence_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Print a one-tick human-readable report.
fn print_tick_report(tick: usize, path: &Path, diagnostics: &TickDiagnostics) {
    let summary = &diagnostics.summary;
    let board = if summary.board_found { "found" } else { "lost" };
    println!(
        "tick {tick:>4}  {:<28}  board {board:<5}  defects {:>2}  segments {:>2}  {:>8.3}ms",
        path.display(),
        summary.stable_defect_count,
        summary.cutting_segment_count,
        diagnostics.total_duration.as_secs_f64() * 1000.0,
    );
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&TickDiagnostics) -> Option<std::time::Duration>;

/// Print aggregated statistics across the whole sequence.
#[allow(clippy::cast_precision_loss)]
fn print_sequence_summary(all_diagnostics: &[TickDiagnostics]) {
    println!();
    println!(
        "Summary ({} ticks)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len().max(1) as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    let board_found = all_diagnostics
        .iter()
        .filter(|d| d.summary.board_found)
        .count();
    println!(
        "Board found on {board_found}/{} ticks",
        all_diagnostics.len(),
    );

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Preprocess", |d| Some(d.preprocess.duration)),
        ("Board Localization", |d| Some(d.board_localization.duration)),
        ("Defect Localization", |d| {
            d.defect_localization.as_ref().map(|s| s.duration)
        }),
        ("Stability", |d| d.stability.as_ref().map(|s| s.duration)),
        ("Cutting", |d| d.cutting.as_ref().map(|s| s.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

//! Cooperative tick driver: one full pipeline pass per scheduler signal.
//!
//! The driver owns the cross-tick [`PipelineState`] and the grayscale
//! [`BufferPool`], and sits between two externally provided seams:
//! a [`FrameSource`] (camera, file replay) and a [`Renderer`] (screen
//! overlay, SVG writer). Each [`TickDriver::step`] executes one tick
//! synchronously and atomically; ticks are processed strictly in frame
//! order and tick *n+1* never starts before tick *n*'s render returns.
//!
//! Error policy per tick:
//! - zero-dimension frame -> the tick is refused and the caller
//!   signalled via `Err`; the driver stays usable,
//! - malformed pixel buffer -> the tick is abandoned (no render) and
//!   reported as [`TickStatus::Skipped`]; scheduling continues,
//! - frame-source failure -> fatal, surfaced to the caller; the core
//!   does not retry.
//!
//! The explicit [`start`](TickDriver::start) / [`stop`](TickDriver::stop)
//! control replaces the original uncontrolled self-rescheduling loop;
//! construction takes an already-initialized source, so readiness is
//! the caller's barrier, not a global callback.

use crate::pool::BufferPool;
use crate::types::{Frame, PipelineConfig, PipelineError, PipelineState, TickOutput};
use crate::{analyze_gray, preprocess};

/// Supplies one frame per tick.
///
/// Implementations wrap the actual acquisition (camera stream, file
/// sequence). The caller constructs the driver only once the source is
/// ready and yields frames with valid dimensions; a zero-dimension
/// frame is still refused defensively.
pub trait FrameSource {
    /// Fatal acquisition error: the source itself is gone.
    type Error: std::error::Error;

    /// Produce the next frame.
    ///
    /// `Ok(None)` means the source is exhausted (end of replay, stream
    /// closed cleanly); `Err` means the source failed and the run is
    /// over.
    ///
    /// # Errors
    ///
    /// Implementation-defined fatal acquisition failures.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// Consumes one render plan per tick.
///
/// Clearing the previous overlay and drawing the board, defect boxes,
/// and cutting segments are the renderer's concern; so are its
/// failures.
pub trait Renderer {
    /// Present one tick's output.
    fn render(&mut self, output: &TickOutput);
}

/// Why a [`TickDriver::step`] call did not render.
#[derive(Debug)]
pub enum TickStatus {
    /// The tick ran to completion and the output was rendered.
    Rendered,
    /// The frame was unusable; the tick was abandoned without a
    /// render and the state left untouched.
    Skipped(PipelineError),
    /// The source reported clean end-of-stream; the driver stopped.
    Exhausted,
    /// The driver is stopped; no frame was pulled.
    Stopped,
}

/// Error from a single driver step.
#[derive(Debug, thiserror::Error)]
pub enum StepError<E: std::error::Error> {
    /// The frame source failed; the run is over.
    #[error("frame source failed: {0}")]
    Source(#[source] E),
    /// The frame was refused before analysis (zero dimensions).
    #[error("frame refused: {0}")]
    Frame(#[from] PipelineError),
}

/// Counts from a completed [`TickDriver::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Ticks that rendered.
    pub rendered: u64,
    /// Ticks abandoned on a malformed frame.
    pub skipped: u64,
}

/// Single-threaded cooperative tick scheduler.
///
/// Exclusively owns the [`PipelineState`]; reads and replaces it once
/// per tick. Under this single-thread model no locking is needed; a
/// pipelined reimplementation would have to hand the state off with a
/// single-writer/single-reader boundary per tick.
#[derive(Debug)]
pub struct TickDriver {
    config: PipelineConfig,
    state: PipelineState,
    pool: BufferPool,
    running: bool,
}

impl TickDriver {
    /// Create a stopped driver with empty initial state.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::empty(),
            pool: BufferPool::new(),
            running: false,
        }
    }

    /// Begin tick scheduling: subsequent [`step`](Self::step) calls
    /// pull frames.
    pub const fn start(&mut self) {
        self.running = true;
    }

    /// Stop tick scheduling: subsequent [`step`](Self::step) calls
    /// return [`TickStatus::Stopped`] without touching the source.
    pub const fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the driver is currently scheduling ticks.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The current cross-tick state (the last tick's accepted boxes).
    #[must_use]
    pub const fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Execute one tick: pull a frame, analyze it, render the output.
    ///
    /// # Errors
    ///
    /// [`StepError::Source`] when the frame source fails (fatal);
    /// [`StepError::Frame`] when the source yields a zero-dimension
    /// frame (the refused-tick contract). A malformed pixel buffer is
    /// not an `Err`: the tick is abandoned and reported as
    /// [`TickStatus::Skipped`].
    pub fn step<S: FrameSource, R: Renderer>(
        &mut self,
        source: &mut S,
        renderer: &mut R,
    ) -> Result<TickStatus, StepError<S::Error>> {
        if !self.running {
            return Ok(TickStatus::Stopped);
        }

        let Some(frame) = source.next_frame().map_err(StepError::Source)? else {
            self.running = false;
            return Ok(TickStatus::Exhausted);
        };

        let mut gray = self.pool.acquire(frame.width, frame.height);
        match preprocess::grayscale_into(&frame, &mut gray) {
            Ok(()) => {}
            Err(err @ PipelineError::InvalidFrame { .. }) => return Err(StepError::Frame(err)),
            Err(err) => return Ok(TickStatus::Skipped(err)),
        }

        let result = analyze_gray(&gray, &self.state, &self.config);
        drop(gray);

        self.state = result.state;
        renderer.render(&result.output);
        Ok(TickStatus::Rendered)
    }

    /// Run ticks until the source is exhausted or [`stop`](Self::stop)
    /// is observed.
    ///
    /// Skipped ticks are counted and scheduling continues, matching
    /// the non-fatal per-tick error policy.
    ///
    /// # Errors
    ///
    /// Propagates the first [`StepError`]; the driver keeps its state,
    /// so a caller may resolve the condition and call `run` again.
    pub fn run<S: FrameSource, R: Renderer>(
        &mut self,
        source: &mut S,
        renderer: &mut R,
    ) -> Result<RunStats, StepError<S::Error>> {
        self.start();
        let mut stats = RunStats::default();
        loop {
            match self.step(source, renderer)? {
                TickStatus::Rendered => stats.rendered += 1,
                TickStatus::Skipped(_) => stats.skipped += 1,
                TickStatus::Exhausted | TickStatus::Stopped => return Ok(stats),
            }
        }
    }
}

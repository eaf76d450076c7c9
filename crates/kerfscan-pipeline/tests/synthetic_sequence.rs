//! Integration test: replay a synthetic frame sequence through the
//! full pipeline and check the cross-tick contracts end to end.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kerfscan_pipeline::{
    Frame, PipelineConfig, PipelineState, Rect, analyze_frame, cutting::cutting_segments,
};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const BOARD: Rect = Rect::new(50, 50, 500, 300);

/// Build an RGBA frame: dark background, bright board, dark defect
/// squares given in board-relative coordinates.
fn frame_with_defects(defects: &[Rect]) -> Frame {
    let mut data = vec![0u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize];
    for y in 0..FRAME_HEIGHT {
        for x in 0..FRAME_WIDTH {
            let on_board =
                x >= BOARD.x && x < BOARD.right() && y >= BOARD.y && y < BOARD.bottom();
            let mut value = if on_board { 200 } else { 30 };
            if on_board {
                for d in defects {
                    if x >= BOARD.x + d.x
                        && x < BOARD.x + d.x + d.width
                        && y >= BOARD.y + d.y
                        && y < BOARD.y + d.y + d.height
                    {
                        value = 20;
                    }
                }
            }
            let i = ((y * FRAME_WIDTH + x) * 4) as usize;
            data[i..i + 3].copy_from_slice(&[value, value, value]);
            data[i + 3] = 255;
        }
    }
    Frame::new(FRAME_WIDTH, FRAME_HEIGHT, data)
}

/// A frame with no board at all.
fn empty_frame() -> Frame {
    let mut data = vec![30u8; (FRAME_WIDTH * FRAME_HEIGHT * 4) as usize];
    data.iter_mut().skip(3).step_by(4).for_each(|a| *a = 255);
    Frame::new(FRAME_WIDTH, FRAME_HEIGHT, data)
}

fn assert_near(actual: Rect, expected: Rect, tolerance: u32) {
    assert!(
        actual.x.abs_diff(expected.x) <= tolerance
            && actual.y.abs_diff(expected.y) <= tolerance
            && actual.width.abs_diff(expected.width) <= 2 * tolerance
            && actual.height.abs_diff(expected.height) <= 2 * tolerance,
        "{actual:?} not within {tolerance}px of {expected:?}"
    );
}

#[test]
fn steady_sequence_detects_board_and_confirms_defects() {
    let config = PipelineConfig::default();
    let defects = [Rect::new(100, 60, 40, 40), Rect::new(400, 60, 40, 40)];
    let frame = frame_with_defects(&defects);

    let tick1 = analyze_frame(&frame, &PipelineState::empty(), &config).unwrap();
    let board = tick1.output.board.expect("board should be detected");
    assert_near(board, BOARD, 4);
    // Candidates are accepted into state but not yet shown.
    assert!(tick1.output.defects.is_empty());
    assert_eq!(tick1.state.accepted.len(), 2);

    let tick2 = analyze_frame(&frame, &tick1.state, &config).unwrap();
    assert_eq!(tick2.output.defects.len(), 2);
    assert_near(
        tick2.output.defects[0],
        Rect::new(150, 110, 40, 40),
        4,
    );
    assert_near(
        tick2.output.defects[1],
        Rect::new(450, 110, 40, 40),
        4,
    );
    // Three clear spans: left of the first defect, between the two,
    // right of the second.
    assert_eq!(tick2.output.cuttings.len(), 3);
    for segment in &tick2.output.cuttings {
        assert_eq!(segment.height, board.height);
        assert_eq!(segment.y, board.y);
        assert!(segment.width > config.min_segment_width);
    }
}

#[test]
fn board_loss_tick_keeps_stale_memory_until_reacquisition() {
    let config = PipelineConfig::default();
    let defect = [Rect::new(100, 60, 40, 40)];
    let frame = frame_with_defects(&defect);

    // Two steady ticks confirm the defect.
    let tick1 = analyze_frame(&frame, &PipelineState::empty(), &config).unwrap();
    let tick2 = analyze_frame(&frame, &tick1.state, &config).unwrap();
    let remembered = tick2.state.clone();
    assert_eq!(tick2.output.defects.len(), 1);
    assert_eq!(remembered.displayed, tick2.output.defects);

    // Tick 3: the board vanishes. Output repeats the displayed set,
    // state is untouched, no cutting segments.
    let tick3 = analyze_frame(&empty_frame(), &remembered, &config).unwrap();
    assert_eq!(tick3.output.board, None);
    assert_eq!(tick3.output.defects, remembered.displayed);
    assert_eq!(tick3.state, remembered);
    assert!(tick3.output.cuttings.is_empty());

    // Tick 4: the board returns. The stale memory still confirms the
    // defect -- board loss did not reset the tracker.
    let tick4 = analyze_frame(&frame, &tick3.state, &config).unwrap();
    assert!(tick4.output.board.is_some());
    assert_eq!(tick4.output.defects.len(), 1);
}

#[test]
fn cutting_scenario_matches_reference_segments() {
    // The reference scenario, fed straight into the segmenter with
    // exact boxes: board {50,50,500,300}, defects at x=100 and x=400.
    let stable = [Rect::new(100, 60, 40, 40), Rect::new(400, 60, 40, 40)];
    let segments = cutting_segments(BOARD, &stable, 30);
    assert_eq!(
        segments,
        vec![
            Rect::new(50, 50, 50, 300),
            Rect::new(140, 50, 260, 300),
            Rect::new(440, 50, 110, 300),
        ]
    );
}

#[test]
fn defect_disappearance_clears_output_next_tick() {
    let config = PipelineConfig::default();
    let with_defect = frame_with_defects(&[Rect::new(100, 60, 40, 40)]);
    let clean = frame_with_defects(&[]);

    let tick1 = analyze_frame(&with_defect, &PipelineState::empty(), &config).unwrap();
    let tick2 = analyze_frame(&with_defect, &tick1.state, &config).unwrap();
    assert_eq!(tick2.output.defects.len(), 1);

    // The defect is gone; nothing to confirm and nothing remembered
    // once the clean tick's (empty) acceptance replaces the state.
    let tick3 = analyze_frame(&clean, &tick2.state, &config).unwrap();
    assert!(tick3.output.defects.is_empty());
    assert!(tick3.state.accepted.is_empty());
    assert!(tick3.state.displayed.is_empty());
    assert_eq!(tick3.output.cuttings.len(), 1);
}

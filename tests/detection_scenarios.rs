//! End-to-end scenarios over the pure-logic portion of the pipeline
//! (PeakStateMachine, Aggregator, Timer), with no dependency on OpenCV or a
//! real video source.

use gate_vision::aggregator::Aggregator;
use gate_vision::gate::{Activation, Detection, DetectionParams, Gate};
use gate_vision::state_machine::PeakStateMachine;
use gate_vision::timer::Timer;

fn gate(name: &str, params: DetectionParams) -> Gate {
    Gate::new(name, (0, 100, 100), (10, 255, 255), params, false)
}

/// Drives `areas` (one attributed area per frame, 0 meaning "no gate
/// dominated this frame") through the state machine and aggregator for a
/// single gate, returning every attributed detection in order.
fn run_single_gate(areas: &[i32], params: DetectionParams) -> Vec<Detection> {
    let mut gates = vec![gate("A", params)];
    let state_machine = PeakStateMachine::new();
    let mut aggregator = Aggregator::new(1);
    let mut accepted = Vec::new();

    for (frame, &area) in areas.iter().enumerate() {
        let frame = frame as u64;
        let g_star = if area > 0 { Some(0) } else { None };
        let candidate = state_machine.update(frame, g_star, area, &mut gates);
        if let Some(detection) = aggregator.absorb(frame, g_star, candidate, &mut gates) {
            accepted.push(detection);
        }
    }

    accepted
}

#[test]
fn single_gate_single_fly_by() {
    let params = DetectionParams {
        lag_frames: 5,
        min_frames_between_peaks: 10,
        min_active_value: 400.0,
        min_active_frames: 3,
        min_inactive_frames: 3,
    };
    // The core fly-by sequence from the scenario, padded with enough
    // trailing zero-frames for the Aggregator's lag window (5) to elapse
    // and close the single resulting burst.
    let mut areas = vec![0, 0, 0, 100, 120, 150, 180, 200, 180, 150, 0, 0, 0, 0, 0];
    areas.extend(std::iter::repeat_n(0, 10));

    let detections = run_single_gate(&areas, params);

    assert_eq!(detections.len(), 1);
    let detection = detections[0];
    assert_eq!(detection.frame_offset, 12);
    assert_eq!(detection.activation.value, 750.0);
    assert_eq!(detection.activation.frames, 5);
}

#[test]
fn two_competing_gates_neither_accumulates_enough() {
    let params = DetectionParams {
        lag_frames: 5,
        min_frames_between_peaks: 10,
        min_active_value: 1.0,
        min_active_frames: 3,
        min_inactive_frames: 2,
    };
    let mut gates = vec![gate("A", params), gate("B", params)];
    let state_machine = PeakStateMachine::new();
    let mut aggregator = Aggregator::new(2);
    let mut accepted = Vec::new();

    // Attribution alternates A,B,A,B,A for five frames, then all zero.
    let attributions = [Some(0usize), Some(1), Some(0), Some(1), Some(0)];
    let mut frame = 0u64;
    for g_star in attributions {
        let area = 100;
        let candidate = state_machine.update(frame, g_star, area, &mut gates);
        if let Some(detection) = aggregator.absorb(frame, g_star, candidate, &mut gates) {
            accepted.push(detection);
        }
        frame += 1;
    }
    for _ in 0..10 {
        let candidate = state_machine.update(frame, None, 0, &mut gates);
        if let Some(detection) = aggregator.absorb(frame, None, candidate, &mut gates) {
            accepted.push(detection);
        }
        frame += 1;
    }

    assert!(accepted.is_empty());
}

#[test]
fn double_peak_within_debounce_window_is_discarded() {
    let params = DetectionParams {
        lag_frames: 3,
        min_frames_between_peaks: 20,
        min_active_value: 100.0,
        min_active_frames: 2,
        min_inactive_frames: 2,
    };
    let burst = [0, 100, 300, 0, 0];
    let zeros_short = [0; 8];
    let mut areas = Vec::new();
    areas.extend(burst);
    areas.extend(zeros_short);
    areas.extend(burst);
    areas.extend([0; 10]);

    let detections = run_single_gate(&areas, params);
    assert_eq!(detections.len(), 1);
}

#[test]
fn double_peak_beyond_debounce_window_both_accepted() {
    let params = DetectionParams {
        lag_frames: 3,
        min_frames_between_peaks: 20,
        min_active_value: 100.0,
        min_active_frames: 2,
        min_inactive_frames: 2,
    };
    let burst = [0, 100, 300, 0, 0];
    let zeros_long = [0; 30];
    let mut areas = Vec::new();
    areas.extend(burst);
    areas.extend(zeros_long);
    areas.extend(burst);
    areas.extend([0; 10]);

    let detections = run_single_gate(&areas, params);
    assert_eq!(detections.len(), 2);
}

#[test]
fn burst_collapse_picks_max_value_candidate() {
    let params = DetectionParams {
        lag_frames: 5,
        min_frames_between_peaks: 10,
        min_active_value: 1.0,
        min_active_frames: 1,
        min_inactive_frames: 1,
    };
    let mut gates = vec![gate("A", params)];
    let state_machine = PeakStateMachine::new();
    let mut aggregator = Aggregator::new(1);

    let mut candidates = vec![
        Detection::new(
            40,
            Activation {
                gate_index: 0,
                frames: 1,
                value: 500.0,
            },
        ),
        Detection::new(
            43,
            Activation {
                gate_index: 0,
                frames: 1,
                value: 900.0,
            },
        ),
        Detection::new(
            46,
            Activation {
                gate_index: 0,
                frames: 1,
                value: 700.0,
            },
        ),
    ];
    candidates.reverse(); // pop() order: 40, 43, 46

    let mut accepted = None;
    for frame in 0..=52u64 {
        let candidate = if candidates.last().is_some_and(|c| c.frame_offset == frame) {
            candidates.pop()
        } else {
            None
        };
        if let Some(detection) = aggregator.absorb(frame, None, candidate, &mut gates) {
            accepted = Some(detection);
        }
    }

    let detection = accepted.expect("burst should close and emit a detection");
    assert_eq!(detection.frame_offset, 43);
    assert_eq!(detection.activation.value, 900.0);
}

#[test]
fn lap_derivation_start_gate_then_b_then_start() {
    let mut timer = Timer::new();
    timer.add_gate(0, 0); // start
    timer.add_gate(1, 1); // gate B

    let start1 = Detection::new(
        10,
        Activation {
            gate_index: 0,
            frames: 1,
            value: 1.0,
        },
    );
    let gate_b = Detection::new(
        25,
        Activation {
            gate_index: 1,
            frames: 1,
            value: 1.0,
        },
    );
    let start2 = Detection::new(
        60,
        Activation {
            gate_index: 0,
            frames: 1,
            value: 1.0,
        },
    );

    timer.add_detection(start1);
    assert_eq!(timer.laps_count(), 0);
    assert!(timer.last_transition().is_none());

    timer.add_detection(gate_b);
    assert_eq!(timer.laps_count(), 0);
    let first_transition = timer.last_transition().unwrap();
    assert_eq!(first_transition.start.frame_offset, 10);
    assert_eq!(first_transition.stop.frame_offset, 25);

    timer.add_detection(start2);
    assert_eq!(timer.laps_count(), 1);
    let lap = timer.last_lap().unwrap();
    assert_eq!(lap.start.frame_offset, 10);
    assert_eq!(lap.stop.frame_offset, 60);

    let second_transition = timer.last_transition().unwrap();
    assert_eq!(second_transition.start.frame_offset, 25);
    assert_eq!(second_transition.stop.frame_offset, 60);
}

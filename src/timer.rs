//! Lap/transition bookkeeping over the stream of accepted detections.
//! Grounded on the reference implementation's `timer.go`/`lap.go`/`transition.go`.

use std::collections::HashMap;

use crate::gate::Detection;

/// A completed lap: two consecutive detections on the start gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lap {
    pub start: Detection,
    pub stop: Detection,
}

impl Lap {
    pub fn frames(&self) -> u64 {
        self.stop.frame_offset - self.start.frame_offset
    }
}

/// A transition between any two consecutive accepted detections, regardless
/// of gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub start: Detection,
    pub stop: Detection,
}

impl Transition {
    pub fn frames(&self) -> u64 {
        self.stop.frame_offset - self.start.frame_offset
    }
}

/// Owns the ordered history of accepted detections and derives laps and
/// transitions from it as they arrive.
#[derive(Debug, Default)]
pub struct Timer {
    detections_in_order: Vec<Detection>,
    detections_by_gate: HashMap<usize, Vec<Detection>>,
    gates_by_position: HashMap<usize, usize>,
    start_gate_index: Option<usize>,
    laps: Vec<Lap>,
    transitions: Vec<Transition>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate at a race position; position 0 is the start gate.
    pub fn add_gate(&mut self, position: usize, gate_index: usize) {
        self.gates_by_position.insert(position, gate_index);
        if position == 0 {
            self.start_gate_index = Some(gate_index);
        }
    }

    /// Record a newly accepted detection, deriving any new lap or
    /// transition it completes.
    pub fn add_detection(&mut self, detection: Detection) {
        let previous = self.last_detection();

        if let Some(prev) = previous {
            if let Some(start_gate) = self.start_gate_index {
                if detection.activation.gate_index == start_gate {
                    if let Some(prior_start_detection) = self.last_detection_for_gate(start_gate) {
                        self.laps.push(Lap {
                            start: prior_start_detection,
                            stop: detection,
                        });
                    }
                }
            }
            self.transitions.push(Transition {
                start: prev,
                stop: detection,
            });
        }

        self.detections_in_order.push(detection);
        self.detections_by_gate
            .entry(detection.activation.gate_index)
            .or_default()
            .push(detection);
    }

    pub fn last_detection(&self) -> Option<Detection> {
        self.detections_in_order.last().copied()
    }

    pub fn last_detection_for_gate(&self, gate_index: usize) -> Option<Detection> {
        self.detections_by_gate
            .get(&gate_index)
            .and_then(|history| history.last())
            .copied()
    }

    pub fn last_lap(&self) -> Option<Lap> {
        self.laps.last().copied()
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.transitions.last().copied()
    }

    pub fn laps_count(&self) -> usize {
        self.laps.len()
    }

    pub fn start_gate(&self) -> Option<usize> {
        self.start_gate_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Activation;

    fn detection(frame: u64, gate_index: usize) -> Detection {
        Detection::new(
            frame,
            Activation {
                gate_index,
                frames: 1,
                value: 1.0,
            },
        )
    }

    #[test]
    fn first_detection_produces_neither_lap_nor_transition() {
        let mut timer = Timer::new();
        timer.add_gate(0, 0);
        timer.add_detection(detection(10, 0));
        assert_eq!(timer.laps_count(), 0);
        assert!(timer.last_transition().is_none());
        assert_eq!(timer.last_detection(), Some(detection(10, 0)));
    }

    #[test]
    fn second_detection_on_any_gate_produces_a_transition() {
        let mut timer = Timer::new();
        timer.add_gate(0, 0);
        timer.add_gate(1, 1);
        timer.add_detection(detection(10, 0));
        timer.add_detection(detection(20, 1));
        let transition = timer.last_transition().expect("transition expected");
        assert_eq!(transition.start.frame_offset, 10);
        assert_eq!(transition.stop.frame_offset, 20);
        assert_eq!(transition.frames(), 10);
        assert_eq!(timer.laps_count(), 0);
    }

    #[test]
    fn second_start_gate_detection_completes_a_lap() {
        let mut timer = Timer::new();
        timer.add_gate(0, 0);
        timer.add_gate(1, 1);
        timer.add_detection(detection(10, 0)); // start
        timer.add_detection(detection(20, 1)); // gate2
        timer.add_detection(detection(35, 0)); // start again: completes a lap

        let lap = timer.last_lap().expect("lap expected");
        assert_eq!(lap.start.frame_offset, 10);
        assert_eq!(lap.stop.frame_offset, 35);
        assert_eq!(lap.frames(), 25);
        assert_eq!(timer.laps_count(), 1);

        // Also produced a transition from the gate2 detection to this one.
        let transition = timer.last_transition().unwrap();
        assert_eq!(transition.start.frame_offset, 20);
        assert_eq!(transition.stop.frame_offset, 35);
    }

    #[test]
    fn no_lap_without_a_registered_start_gate() {
        let mut timer = Timer::new();
        timer.add_gate(1, 1); // no position 0 registered
        timer.add_detection(detection(10, 1));
        timer.add_detection(detection(20, 1));
        assert_eq!(timer.laps_count(), 0);
        assert!(timer.last_transition().is_some());
    }
}

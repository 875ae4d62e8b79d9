//! Per-frame accumulator update turning attributed pixel counts into
//! candidate peak detections. Grounded on §4.4 and the reference
//! implementation's `Detector.Detect` accumulator logic.

use crate::gate::{Activation, Detection, Gate};

/// Growth factor a newly attributed area must exceed over the gate's
/// `last_area` to count as still-growing marker activity.
const GROWTH_FACTOR: f64 = 1.1;

/// Drives the per-gate accumulators described in §4.4. Stateless itself;
/// all state lives on the `Gate`s it is handed each frame.
#[derive(Debug, Default)]
pub struct PeakStateMachine;

impl PeakStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Update every gate's accumulator for frame `f`, given the attributed
    /// gate `g_star` (if any) and its detected area. Returns at most one
    /// candidate peak, honoring the "first-emitter-wins" rule.
    pub fn update(
        &self,
        frame: u64,
        g_star: Option<usize>,
        a_star: i32,
        gates: &mut [Gate],
    ) -> Option<Detection> {
        if let Some(winner) = g_star {
            let gate = &mut gates[winner];
            let area = a_star as f64;
            if area > GROWTH_FACTOR * gate.last_area as f64 {
                gate.active_frames += 1;
                gate.active_value += area;
                gate.inactive_frames = 0;
            }
            gate.active_area = a_star;
            gate.last_area = a_star;
        }

        for (i, gate) in gates.iter_mut().enumerate() {
            if Some(i) != g_star {
                gate.inactive_frames += 1;
            }
        }

        let mut candidate = None;
        for (i, gate) in gates.iter_mut().enumerate() {
            if gate.inactive_frames < gate.detection_params.min_inactive_frames {
                continue;
            }

            if candidate.is_none()
                && gate.active_frames >= gate.detection_params.min_active_frames
                && gate.active_value >= gate.detection_params.min_active_value
            {
                candidate = Some(Detection::new(
                    frame,
                    Activation {
                        gate_index: i,
                        frames: gate.active_frames,
                        value: gate.active_value,
                    },
                ));
            }

            gate.clear_accumulator();
        }

        candidate
    }
}

//! Collapses bursts of candidate peaks from a single fly-by into one
//! attributed detection per gate. Grounded on §4.5.

use crate::gate::{Detection, Gate};

/// Per-gate candidate accumulation and burst-closing logic.
#[derive(Debug, Default)]
pub struct Aggregator {
    candidates: Vec<Vec<Detection>>,
}

impl Aggregator {
    pub fn new(gate_count: usize) -> Self {
        Self {
            candidates: vec![Vec::new(); gate_count],
        }
    }

    /// Absorb this frame's candidate (if any) and, when no gate is
    /// currently dominating the frame, close any bursts whose lag window
    /// has elapsed. Returns at most one attributed detection, already
    /// passed through the debounce filter against each gate's
    /// `last_detection`.
    pub fn absorb(
        &mut self,
        frame: u64,
        g_star: Option<usize>,
        candidate: Option<Detection>,
        gates: &mut [Gate],
    ) -> Option<Detection> {
        if let Some(detection) = candidate {
            self.candidates[detection.activation.gate_index].push(detection);
        }

        if g_star.is_some() {
            return None;
        }

        // Every gate whose lag window has elapsed closes its burst this
        // frame, regardless of whether an earlier gate's burst is the one
        // that ends up emitted; only the emission itself is capped at one
        // per frame (§4.6), not the closing/clearing.
        let mut result = None;

        for gate_index in 0..gates.len() {
            let Some(last) = self.candidates[gate_index].last() else {
                continue;
            };
            let lag = gates[gate_index].detection_params.lag_frames;
            if frame.saturating_sub(last.frame_offset) <= lag {
                continue;
            }

            let burst = std::mem::take(&mut self.candidates[gate_index]);
            let winner = burst
                .iter()
                .fold(None::<&Detection>, |best, d| match best {
                    None => Some(d),
                    Some(b) if d.activation.value > b.activation.value => Some(d),
                    Some(b) if d.activation.value == b.activation.value
                        && d.frame_offset > b.frame_offset =>
                    {
                        Some(d)
                    }
                    Some(b) => Some(b),
                })
                .copied();

            let Some(tentative) = winner else { continue };

            let gate = &mut gates[gate_index];
            let passes_debounce = match gate.last_detection {
                Some(last_accepted) => {
                    tentative.frame_offset.saturating_sub(last_accepted.frame_offset)
                        >= gate.detection_params.min_frames_between_peaks
                }
                None => true,
            };

            // Only the first closure this frame is actually delivered
            // (§4.6: at most one attributed detection per frame). A surplus
            // closure on another gate must not update `last_detection`: the
            // external Timer never receives it, so the debounce reference
            // for this gate's *next* burst must stay whatever the Timer
            // last actually saw, not this dropped tentative detection.
            if passes_debounce && result.is_none() {
                gate.last_detection = Some(tentative);
                result = Some(tentative);
            }
        }

        result
    }
}

//! Attributes a segmented frame's non-zero pixels to the gate whose hue
//! range they fall within, by full enumeration (see §4.3's note on why this
//! implementation does not subsample).

use opencv::core::{Mat, Point2i, Vec3b};
use opencv::prelude::*;

use crate::error::{Error, Result};
use crate::gate::Gate;

/// Outcome of attributing one frame's non-zero pixels to a gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribution {
    /// Index into the driver's gate list of the dominant gate, if any.
    pub gate_index: Option<usize>,
    /// Pixel count attributed to the dominant gate (0 if `gate_index` is `None`).
    pub area: i32,
    /// Total non-zero pixels considered.
    pub total_area: usize,
}

/// Pure logic over an HSV frame and its non-zero pixel set; holds no state
/// of its own across frames.
#[derive(Debug, Default)]
pub struct GateAttributor;

impl GateAttributor {
    pub fn new() -> Self {
        Self
    }

    /// Run the §4.3 algorithm: for every non-zero pixel, read its hue and
    /// credit every gate whose range contains it, then return the argmax.
    pub fn attribute(&self, hsv: &Mat, non_zero: &[Point2i], gates: &[Gate]) -> Result<Attribution> {
        let mut counts = vec![0i32; gates.len()];

        for point in non_zero {
            let pixel: &Vec3b = hsv
                .at_2d(point.y, point.x)
                .map_err(|e| Error::ImageProcessing(e.to_string()))?;
            let hue = pixel[0] as i32;
            for (i, gate) in gates.iter().enumerate() {
                if gate.is_same_hue(hue) {
                    counts[i] += 1;
                }
            }
        }

        // First-added wins on ties: only replace the incumbent on a strictly
        // greater count, never on equal.
        let mut best: Option<(usize, i32)> = None;
        for (index, &count) in counts.iter().enumerate() {
            if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((index, count));
            }
        }

        match best {
            Some((index, area)) => Ok(Attribution {
                gate_index: Some(index),
                area,
                total_area: non_zero.len(),
            }),
            None => Ok(Attribution {
                gate_index: None,
                area: 0,
                total_area: non_zero.len(),
            }),
        }
    }
}

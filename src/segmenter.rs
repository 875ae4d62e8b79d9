//! Turns a decoded frame into a binary mask of marker-colored pixels.

use opencv::core::{
    self, Mat, Point, Point2i, Scalar, Size, BORDER_CONSTANT, CV_8UC1,
};
use opencv::imgproc;
use opencv::prelude::*;
use rayon::prelude::*;

use crate::config::PropellerMaskConfig;
use crate::error::Result;
use crate::gate::Gate;

/// Output of one segmentation pass: the binary mask, the HSV frame it was
/// derived from, and the coordinates of every non-zero pixel in the mask.
pub struct Segmentation {
    pub binary: Mat,
    pub hsv: Mat,
    pub non_zero: Vec<Point2i>,
}

/// Stateless (across frames) segmentation pipeline. Holds only reusable
/// scratch configuration, grounded on the reference implementation's
/// `Detector` scratch-buffer fields and `gocv`-based `Detect` method.
pub struct FrameSegmenter {
    erode_size: i32,
    left_prop_poly: core::Vector<Point>,
    right_prop_poly: core::Vector<Point>,
}

impl FrameSegmenter {
    pub fn new(erode_size: u32, propeller_mask: PropellerMaskConfig, frame_size: Size) -> Self {
        let w = frame_size.width;
        let h = frame_size.height;
        let pw = propeller_mask.width;
        let ph = propeller_mask.height;

        let mut left_prop_poly = core::Vector::new();
        left_prop_poly.push(Point::new(0, h));
        left_prop_poly.push(Point::new(0, h - ph));
        left_prop_poly.push(Point::new(pw, h));

        let mut right_prop_poly = core::Vector::new();
        right_prop_poly.push(Point::new(w, h));
        right_prop_poly.push(Point::new(w, h - ph));
        right_prop_poly.push(Point::new(w - pw, h));

        Self {
            erode_size: erode_size as i32,
            left_prop_poly,
            right_prop_poly,
        }
    }

    /// Run the §4.2 algorithm over one BGR frame.
    pub fn segment(&self, bgr: &Mat, gates: &[Gate]) -> Result<Segmentation> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(bgr, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

        let mut union_mask = Mat::default();
        let per_gate_masks: Vec<Mat> = gates
            .par_iter()
            .map(|gate| {
                let lower = Scalar::new(
                    gate.hue_lower.0 as f64,
                    gate.hue_lower.1 as f64,
                    gate.hue_lower.2 as f64,
                    0.0,
                );
                let upper = Scalar::new(
                    gate.hue_upper.0 as f64,
                    gate.hue_upper.1 as f64,
                    gate.hue_upper.2 as f64,
                    0.0,
                );
                let mut mask = Mat::default();
                core::in_range(&hsv, &lower, &upper, &mut mask)
                    .expect("in_range on a well-formed HSV mat");
                mask
            })
            .collect();

        for mask in &per_gate_masks {
            if union_mask.empty() {
                union_mask = mask.clone();
            } else {
                let mut next = Mat::default();
                core::bitwise_or(&union_mask, mask, &mut next, &core::no_array())?;
                union_mask = next;
            }
        }
        if union_mask.empty() {
            union_mask = Mat::new_size_with_default(
                hsv.size()?,
                CV_8UC1,
                Scalar::all(0.0),
            )?;
        }

        let mut colored = Mat::default();
        core::bitwise_and(&hsv, &hsv, &mut colored, &union_mask)?;

        let mut gray = Mat::default();
        imgproc::cvt_color(&colored, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut binary = Mat::default();
        imgproc::threshold(
            &gray,
            &mut binary,
            100.0,
            255.0,
            imgproc::THRESH_BINARY,
        )?;

        let mut polys = core::Vector::<core::Vector<Point>>::new();
        polys.push(self.left_prop_poly.clone());
        polys.push(self.right_prop_poly.clone());
        imgproc::fill_poly(
            &mut binary,
            &polys,
            Scalar::all(0.0),
            imgproc::LINE_8,
            0,
            Point::new(0, 0),
        )?;

        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            Size::new(self.erode_size, self.erode_size),
            Point::new(-1, -1),
        )?;
        let mut eroded = Mat::default();
        imgproc::erode(
            &binary,
            &mut eroded,
            &kernel,
            Point::new(-1, -1),
            1,
            BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;
        let mut dilated = Mat::default();
        imgproc::dilate(
            &eroded,
            &mut dilated,
            &kernel,
            Point::new(-1, -1),
            1,
            BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let mut non_zero = core::Vector::<Point2i>::new();
        core::find_non_zero(&dilated, &mut non_zero)?;

        Ok(Segmentation {
            binary: dilated,
            hsv,
            non_zero: non_zero.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, Vec3b, CV_8UC3};

    use crate::gate::DetectionParams;

    fn params() -> DetectionParams {
        DetectionParams {
            lag_frames: 5,
            min_frames_between_peaks: 10,
            min_active_value: 50.0,
            min_active_frames: 2,
            min_inactive_frames: 3,
        }
    }

    #[test]
    fn propeller_mask_hides_pixels_inside_bottom_left_triangle() {
        let frame_size = Size::new(100, 100);
        let propeller_mask = PropellerMaskConfig {
            width: 50,
            height: 50,
        };
        let segmenter = FrameSegmenter::new(4, propeller_mask, frame_size);
        let gates = vec![Gate::new(
            "start",
            (0, 100, 100),
            (10, 255, 255),
            params(),
            false,
        )];

        let mut frame =
            Mat::new_size_with_default(frame_size, CV_8UC3, Scalar::all(0.0)).unwrap();
        // Pure red (BGR) converts to hue 0, well inside the gate's range,
        // placed at (x=5, y=98): inside the bottom-left propeller triangle
        // whose vertices are (0,100), (0,50), (50,100).
        *frame.at_2d_mut::<Vec3b>(98, 5).unwrap() = Vec3b::from([0, 0, 255]);

        let segmentation = segmenter.segment(&frame, &gates).unwrap();
        assert!(segmentation.non_zero.is_empty());
    }
}

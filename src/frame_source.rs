//! Abstracts over where decoded BGR frames come from, so the driver and its
//! tests do not depend on a live video device.

use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCaptureTrait, VideoCaptureTraitConst};

use crate::error::{Error, Result};

/// The fixed frame size the detection pipeline operates on after resize.
pub const DETECTION_FRAME_SIZE: Size = Size {
    width: 480,
    height: 360,
};

/// A source of decoded BGR frames, resized to [`DETECTION_FRAME_SIZE`].
pub trait FrameSource {
    /// Read the next frame. Returns `Ok(None)` at end of stream.
    fn read(&mut self) -> Result<Option<Mat>>;
}

/// An OpenCV-backed frame source reading from a file path or capture device
/// URL via `videoio::VideoCapture`.
pub struct VideoCaptureSource {
    capture: videoio::VideoCapture,
}

impl VideoCaptureSource {
    pub fn open(path: &str) -> Result<Self> {
        let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY).map_err(|e| {
            Error::VideoSourceOpen {
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !capture
            .is_opened()
            .map_err(|e| Error::VideoSourceOpen {
                path: path.to_string(),
                reason: e.to_string(),
            })?
        {
            return Err(Error::VideoSourceOpen {
                path: path.to_string(),
                reason: "video source could not be opened".to_string(),
            });
        }
        Ok(Self { capture })
    }
}

impl FrameSource for VideoCaptureSource {
    fn read(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| Error::VideoSourceRead(e.to_string()))?;
        if !ok || frame.empty() {
            return Ok(None);
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &frame,
            &mut resized,
            DETECTION_FRAME_SIZE,
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )
        .map_err(|e| Error::ImageProcessing(e.to_string()))?;
        Ok(Some(resized))
    }
}

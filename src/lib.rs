//! # gate-vision
//!
//! Real-time lap and split timing for FPV drone races, derived from a live
//! or recorded video feed of colored gate markers.
//!
//! ## Pipeline
//!
//! Each frame is segmented into marker-colored pixels ([`segmenter`]),
//! attributed to the dominant gate ([`attributor`]), fed through a per-gate
//! peak detector ([`state_machine`]) and burst aggregator ([`aggregator`]),
//! and the resulting detections are handed to a [`timer::Timer`] that
//! derives laps and transitions. [`driver::PipelineDriver`] wires the whole
//! thing together.

pub mod aggregator;
pub mod announcer;
pub mod attributor;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame_source;
pub mod gate;
pub mod plot;
pub mod ring_buffer;
pub mod segmenter;
pub mod state_machine;
pub mod timer;

pub use config::Config;
pub use driver::PipelineDriver;
pub use error::{Error, Result};
pub use gate::{Activation, Detection, Gate};
pub use timer::{Lap, Timer, Transition};

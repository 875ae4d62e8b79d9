//! Wires every component together into the per-frame loop described in
//! §4.6, from reading a frame through to announcing completed laps.

use std::time::Instant;

use log::{debug, info};

use crate::aggregator::Aggregator;
use crate::announcer::{lap_message, transition_message, Announcer};
use crate::attributor::GateAttributor;
use crate::config::Config;
use crate::error::Result;
use crate::frame_source::FrameSource;
use crate::gate::{DetectionParams, Gate};
use crate::plot::{PlotDatapoint, PlotSink};
use crate::ring_buffer::SumBuffer;
use crate::segmenter::FrameSegmenter;
use crate::state_machine::PeakStateMachine;
use crate::timer::Timer;

/// Capacity of each gate's smoothed-metric moving-sum buffer, feeding the
/// value published to the plot queue.
const SMOOTHING_WINDOW: usize = 5;

/// Orchestrates one race's worth of frame processing.
pub struct PipelineDriver<S, A> {
    frame_source: S,
    segmenter: FrameSegmenter,
    attributor: GateAttributor,
    state_machine: PeakStateMachine,
    aggregator: Aggregator,
    timer: Timer,
    announcer: A,
    plot: Option<PlotSink>,
    gates: Vec<Gate>,
    smoothing: Vec<SumBuffer>,
    pilot_name: String,
    say_laps: bool,
    frames_per_sec: f64,
    frame_count: u64,
}

impl<S: FrameSource, A: Announcer> PipelineDriver<S, A> {
    pub fn new(config: &Config, frame_source: S, announcer: A, plot: Option<PlotSink>) -> Self {
        let gates: Vec<Gate> = config
            .gates
            .iter()
            .map(|gc| {
                Gate::new(
                    gc.name.clone(),
                    gc.color.lower_bound_hsv,
                    gc.color.upper_bound_hsv,
                    DetectionParams::from(gc.detection),
                    gc.announcements.say_transitions,
                )
            })
            .collect();

        let mut timer = Timer::new();
        for (position, _gate) in gates.iter().enumerate() {
            timer.add_gate(position, position);
        }

        let segmenter = FrameSegmenter::new(
            config.detection.erode,
            config.propeller_mask,
            crate::frame_source::DETECTION_FRAME_SIZE,
        );

        let smoothing = gates.iter().map(|_| SumBuffer::new(SMOOTHING_WINDOW)).collect();

        info!(
            "starting pipeline with {} gates at {} fps",
            gates.len(),
            config.frames_per_sec
        );
        for gate in &gates {
            info!(
                "gate {:?}: hue [{:?}, {:?}]",
                gate.name, gate.hue_lower, gate.hue_upper
            );
        }

        Self {
            frame_source,
            segmenter,
            attributor: GateAttributor::new(),
            state_machine: PeakStateMachine::new(),
            aggregator: Aggregator::new(gates.len()),
            timer,
            announcer,
            plot,
            gates,
            smoothing,
            pilot_name: config.announcements.pilot_name.clone(),
            say_laps: config.announcements.say_laps,
            frames_per_sec: config.frames_per_sec,
            frame_count: 0,
        }
    }

    /// Run the per-frame loop to completion (end of stream).
    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(frame) = self.frame_source.read()? else {
                break;
            };

            let start = Instant::now();
            self.process_frame(&frame)?;
            let latency = start.elapsed();
            debug!("frame {} processed in {:?}", self.frame_count, latency);

            self.frame_count += 1;
        }

        if let Some(plot) = &mut self.plot {
            plot.shutdown();
        }

        Ok(())
    }

    fn process_frame(&mut self, frame: &opencv::core::Mat) -> Result<()> {
        let segmentation = self.segmenter.segment(frame, &self.gates)?;
        let attribution =
            self.attributor
                .attribute(&segmentation.hsv, &segmentation.non_zero, &self.gates)?;

        let candidate = self.state_machine.update(
            self.frame_count,
            attribution.gate_index,
            attribution.area,
            &mut self.gates,
        );

        let detection = self.aggregator.absorb(
            self.frame_count,
            attribution.gate_index,
            candidate,
            &mut self.gates,
        );

        for i in 0..self.gates.len() {
            self.smoothing[i].push(if Some(i) == attribution.gate_index {
                attribution.area as f64
            } else {
                0.0
            });
        }

        if let Some(plot) = &self.plot {
            let values = self
                .smoothing
                .iter()
                .enumerate()
                .map(|(i, buf)| (i, buf.at(0).unwrap_or(0.0)))
                .collect();
            plot.publish(PlotDatapoint {
                frame: self.frame_count,
                values,
            });
        }

        if let Some(detection) = detection {
            info!(
                "detection: gate={:?} frame={}",
                self.gates[detection.activation.gate_index].name, detection.frame_offset
            );

            let gate_index = detection.activation.gate_index;
            let previous = self.timer.last_detection();
            self.timer.add_detection(detection);

            if self.say_laps {
                if let Some(lap) = self.timer.last_lap() {
                    if lap.stop.frame_offset == detection.frame_offset {
                        self.announcer.announce_best_effort(&lap_message(
                            &self.pilot_name,
                            lap.frames(),
                            self.frames_per_sec,
                        ));
                    }
                }
            }

            if self.gates[gate_index].say_transitions {
                if let (Some(prev), Some(transition)) = (previous, self.timer.last_transition()) {
                    if transition.stop.frame_offset == detection.frame_offset
                        && transition.start.frame_offset == prev.frame_offset
                    {
                        self.announcer.announce_best_effort(&transition_message(
                            transition.frames(),
                            self.frames_per_sec,
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

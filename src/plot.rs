//! The plot queue carrying per-frame, per-gate metric snapshots to a
//! background consumer. Grounded on the reference implementation's
//! `video_recorder.rs` producer/consumer-thread pattern: a bounded
//! `crossbeam_channel`, non-blocking sends that drop frames rather than
//! stall the detection pipeline, and sender-drop-to-signal-shutdown.

use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{trace, warn};

/// One frame's worth of per-gate metric values, published for plotting.
#[derive(Debug, Clone)]
pub struct PlotDatapoint {
    pub frame: u64,
    pub values: Vec<(usize, f64)>,
}

/// A consumer of plot datapoints, run on its own thread. Kept generic so
/// tests can supply a simple in-memory sink instead of a real chart
/// renderer.
pub trait PlotConsumer: Send + 'static {
    fn consume(&mut self, datapoint: PlotDatapoint);
}

/// Owns the producer side of a bounded channel to a background consumer
/// thread, matching the reference stack's recorder pattern: a bounded
/// queue, `try_send` with a dropped-frame trace log on a full queue, and a
/// clean join on drop.
pub struct PlotSink {
    sender: Option<Sender<PlotDatapoint>>,
    consumer_thread: Option<JoinHandle<()>>,
}

const PLOT_QUEUE_DEPTH: usize = 100;

impl PlotSink {
    /// Spawn the consumer thread and return the sink owning its channel.
    pub fn spawn(mut consumer: impl PlotConsumer) -> Self {
        let (sender, receiver) = bounded::<PlotDatapoint>(PLOT_QUEUE_DEPTH);
        let consumer_thread = std::thread::spawn(move || {
            for datapoint in receiver {
                consumer.consume(datapoint);
            }
        });

        Self {
            sender: Some(sender),
            consumer_thread: Some(consumer_thread),
        }
    }

    /// Publish a datapoint without blocking; drops and logs on a full queue.
    pub fn publish(&self, datapoint: PlotDatapoint) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(datapoint) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                trace!("plot queue full, dropping datapoint");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("plot consumer thread is gone, dropping datapoint");
            }
        }
    }

    /// Drop the sender (signaling the consumer thread to drain and exit)
    /// and join it.
    pub fn shutdown(&mut self) {
        self.sender = None;
        if let Some(thread) = self.consumer_thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PlotSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

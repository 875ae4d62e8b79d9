//! Formats and delivers lap/split announcements. Out-of-core, best-effort:
//! a failing announcer logs and the pipeline continues. Grounded on the
//! reference implementation's Windows SAPI helper (`tts-windows.go`).

use log::warn;

/// Render a frame count as spoken duration text: seconds (or minutes for
/// durations of 60 seconds or more), two decimal digits, with the decimal
/// point replaced by a space so a speech synthesizer reads the digits
/// individually rather than as a single number. No unit word is appended;
/// the reference implementation's own call sites never include one.
pub fn duration_as_spoken(frames: u64, frames_per_sec: f64) -> String {
    let total_seconds = frames as f64 / frames_per_sec;
    let value = if total_seconds >= 60.0 {
        total_seconds / 60.0
    } else {
        total_seconds
    };
    format!("{value:.2}").replace('.', " ")
}

/// Format a lap announcement: `"{pilot_name} {duration_as_spoken}"`.
pub fn lap_message(pilot_name: &str, frames: u64, frames_per_sec: f64) -> String {
    format!("{pilot_name} {}", duration_as_spoken(frames, frames_per_sec))
}

/// Format a transition (split) announcement: `"split {duration_as_spoken}"`.
pub fn transition_message(frames: u64, frames_per_sec: f64) -> String {
    format!("split {}", duration_as_spoken(frames, frames_per_sec))
}

/// A sink for announcement text. Implementations are expected to be
/// fire-and-forget and non-blocking from the driver's perspective; a
/// delivery failure is reported via `Err` rather than aborting anything.
pub trait Announcer {
    fn announce(&mut self, message: &str) -> std::result::Result<(), String>;

    /// Deliver best-effort: log and swallow any failure rather than
    /// propagate it, so a broken downstream sink never aborts the race.
    fn announce_best_effort(&mut self, message: &str) {
        if let Err(reason) = self.announce(message) {
            warn!("announcer failed to deliver {message:?}: {reason}");
        }
    }
}

/// Default announcer: logs the message at info level rather than speaking
/// it. Platform text-to-speech is out of scope for the core pipeline.
#[derive(Debug, Default)]
pub struct LoggingAnnouncer;

impl Announcer for LoggingAnnouncer {
    fn announce(&mut self, message: &str) -> std::result::Result<(), String> {
        log::info!("announce: {message}");
        Ok(())
    }
}

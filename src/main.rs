//! gate-vision - real-time lap and split timing for FPV drone races.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use gate_vision::announcer::LoggingAnnouncer;
use gate_vision::config::Config;
use gate_vision::frame_source::VideoCaptureSource;
use gate_vision::plot::PlotSink;
use gate_vision::PipelineDriver;

/// Real-time lap and split timing for FPV drone races from a live video feed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path or URL of the video source to read frames from.
    #[arg(long)]
    video: String,

    /// Path to the race's YAML configuration file.
    #[arg(long)]
    config: std::path::PathBuf,
}

struct DiscardConsumer;

impl gate_vision::plot::PlotConsumer for DiscardConsumer {
    fn consume(&mut self, _datapoint: gate_vision::plot::PlotDatapoint) {}
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // clap's own `Cli::parse()` exits with code 2 on a missing required
    // argument; the spec requires exit code 1 for that case, so usage
    // errors are printed and the process exit is driven by hand. `--help`
    // and `--version` keep clap's normal exit-0 behavior.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit();
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {:?}", cli.config))?;

    let frame_source = VideoCaptureSource::open(&cli.video)
        .with_context(|| format!("opening video source {:?}", cli.video))?;

    let plot = PlotSink::spawn(DiscardConsumer);
    let announcer = LoggingAnnouncer;

    let mut driver = PipelineDriver::new(&config, frame_source, announcer, Some(plot));
    driver.run().context("running detection pipeline")?;

    Ok(())
}

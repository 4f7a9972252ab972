//! Offline replay driver: runs the tracking pipeline over a recorded
//! session and logs the evolving track set.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use pointtrack_rs::{OfflineReplay, TickStatus, TrackerConfig, TrackingPipeline};

/// Replay a recorded mmWave detection log through the tracker.
#[derive(Debug, Parser)]
#[command(name = "replay")]
struct Args {
    /// Directory holding the numbered `<N>.csv` log files.
    log_dir: PathBuf,

    /// Target frame period in milliseconds.
    #[arg(long, default_value_t = 100)]
    frame_period_ms: u64,

    /// Cap on simultaneously active tracks.
    #[arg(long)]
    max_tracks: Option<usize>,

    /// Association gate threshold.
    #[arg(long)]
    gate: Option<f64>,

    /// DBSCAN core-point neighborhood size.
    #[arg(long)]
    min_samples: Option<usize>,

    /// Sensor mounting height in meters.
    #[arg(long)]
    sensor_height: Option<f64>,

    /// Sensor tilt about the x-axis in degrees.
    #[arg(long)]
    sensor_tilt: Option<f64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut config = TrackerConfig::default();
    if let Some(max_tracks) = args.max_tracks {
        config.max_tracks = max_tracks;
    }
    if let Some(gate) = args.gate {
        config.gate = gate;
    }
    if let Some(min_samples) = args.min_samples {
        config.db_min_samples = min_samples;
    }
    if let Some(height) = args.sensor_height {
        config.sensor_height = height;
    }
    if let Some(tilt) = args.sensor_tilt {
        config.sensor_tilt = tilt;
    }

    let source = match OfflineReplay::new(&args.log_dir) {
        Ok(source) => source,
        Err(err) => {
            error!("failed to open session {}: {err}", args.log_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let mut pipeline = match TrackingPipeline::new(source, config) {
        Ok(pipeline) => {
            pipeline.with_frame_period(Duration::from_millis(args.frame_period_ms))
        }
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut frames = 0u64;
    loop {
        match pipeline.tick() {
            Ok(TickStatus::Finished) => break,
            Ok(TickStatus::Idle { .. }) => {}
            Ok(TickStatus::Tracked { index }) => {
                frames += 1;
                for track in pipeline.tracks() {
                    info!(
                        "frame {index}: track {} {:?} at ({:.2}, {:.2}, {:.2}), {} points, lifetime {:.2}s",
                        track.id,
                        track.mode,
                        track.state.x[0],
                        track.state.x[1],
                        track.state.x[2],
                        track.cluster.point_num,
                        track.lifetime,
                    );
                }
            }
            Err(err) => {
                error!("replay failed: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    info!(
        "replay finished: {frames} frames, {} tracks still active",
        pipeline.tracks().len()
    );
    ExitCode::SUCCESS
}

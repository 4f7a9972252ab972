//! TrackingPipeline for combining a frame source with the cluster tracker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::integration::source::{FrameSource, SourceRead};
use crate::tracker::{ClusterTrack, ConfigError, TrackBuffer, TrackerConfig, normalize_frame};

/// Outcome of one pipeline tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// A frame was consumed and the track set updated.
    Tracked { index: u64 },
    /// The source had no data; tracks drifted forward.
    Idle { index: u64 },
    /// The source is exhausted; the session is over.
    Finished,
}

/// A combined driver that bundles a frame source with the cluster tracker.
///
/// One tick runs the full per-frame pipeline to completion; consumers read
/// the track set between ticks.
pub struct TrackingPipeline<S: FrameSource> {
    source: S,
    buffer: TrackBuffer,
    frame_period: Duration,
    last_timestamp: Option<f64>,
    last_instant: Option<Instant>,
}

impl<S: FrameSource> TrackingPipeline<S> {
    /// Create a pipeline. Configuration mismatches are fatal here, before
    /// the loop starts.
    pub fn new(source: S, config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            buffer: TrackBuffer::new(config),
            frame_period: Duration::from_millis(100),
            last_timestamp: None,
            last_instant: None,
        })
    }

    /// Override the target frame period used for `run` padding and as the
    /// first frame's delta.
    pub fn with_frame_period(mut self, period: Duration) -> Self {
        self.frame_period = period;
        self
    }

    /// Process one source read: normalize, then run the tracker stages.
    pub fn tick(&mut self) -> Result<TickStatus, S::Error> {
        match self.source.read()? {
            SourceRead::Exhausted => Ok(TickStatus::Finished),
            SourceRead::Skip { index } => {
                let dt = self.skip_delta();
                self.buffer.step(&[], dt);
                Ok(TickStatus::Idle { index })
            }
            SourceRead::Frame {
                index,
                timestamp,
                frame,
            } => {
                let dt = self.frame_delta(timestamp);
                let points = normalize_frame(&frame, self.buffer.config());
                self.buffer.step(&points, dt);
                Ok(TickStatus::Tracked { index })
            }
        }
    }

    /// Drive the loop until the source is exhausted or `stop` is raised,
    /// padding each iteration out to the frame period. Cancellation takes
    /// effect at the next iteration boundary, leaving only fully committed
    /// frames behind.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), S::Error> {
        while !stop.load(Ordering::Relaxed) {
            let started = Instant::now();
            if matches!(self.tick()?, TickStatus::Finished) {
                break;
            }
            thread::sleep(self.frame_period.saturating_sub(started.elapsed()));
        }
        Ok(())
    }

    /// Elapsed seconds since the previous frame: recorded timestamps when
    /// the source supplies them, wall clock otherwise.
    fn frame_delta(&mut self, timestamp: Option<f64>) -> f64 {
        let period = self.frame_period.as_secs_f64();
        match timestamp {
            Some(now) => {
                let dt = self
                    .last_timestamp
                    .map_or(period, |prev| (now - prev).max(0.0));
                self.last_timestamp = Some(now);
                dt
            }
            None => {
                let now = Instant::now();
                let dt = self
                    .last_instant
                    .map_or(period, |prev| now.duration_since(prev).as_secs_f64());
                self.last_instant = Some(now);
                dt
            }
        }
    }

    /// Delta for a data-less tick. Recorded time advances by one period so
    /// the next frame's delta is not counted twice.
    fn skip_delta(&mut self) -> f64 {
        match self.last_timestamp {
            Some(prev) => {
                let period = self.frame_period.as_secs_f64();
                self.last_timestamp = Some(prev + period);
                period
            }
            None => self.frame_delta(None),
        }
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the underlying track buffer.
    pub fn buffer(&self) -> &TrackBuffer {
        &self.buffer
    }

    /// Active tracks after the most recent tick.
    pub fn tracks(&self) -> &[ClusterTrack] {
        self.buffer.tracks()
    }
}

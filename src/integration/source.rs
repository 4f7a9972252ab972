//! Trait for detection frame producers.

use crate::tracker::RawFrame;

/// One pull from a frame source.
#[derive(Debug, Clone)]
pub enum SourceRead {
    /// A frame of detections is available.
    Frame {
        /// Monotone frame counter.
        index: u64,
        /// Capture time in seconds since the epoch, when the source records
        /// one; wall clock is used otherwise.
        timestamp: Option<f64>,
        frame: RawFrame,
    },
    /// The source produced nothing this period; the tracker runs a
    /// predict-only iteration.
    Skip {
        /// Monotone frame counter.
        index: u64,
    },
    /// No further frames will ever arrive.
    Exhausted,
}

/// Trait for detection frame producers.
///
/// Implement this to connect a live sensor driver or a recorded session to
/// the tracking pipeline.
///
/// # Example
///
/// ```ignore
/// use pointtrack_rs::{FrameSource, SourceRead};
///
/// struct MySensor {
///     // Your driver here
/// }
///
/// impl FrameSource for MySensor {
///     type Error = std::io::Error;
///
///     fn read(&mut self) -> Result<SourceRead, Self::Error> {
///         // Block until the next frame period and return its detections
///         Ok(SourceRead::Exhausted)
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for read failures.
    type Error;

    /// Pull the next frame record. This is the loop's blocking point; it
    /// must not be called concurrently with reads of the track set.
    fn read(&mut self) -> Result<SourceRead, Self::Error>;
}

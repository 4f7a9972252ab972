//! Integration module for connecting detection frame producers with the
//! tracker.
//!
//! This module provides the pull interface over sensor and replay sources
//! and the pipeline driver that runs the per-frame stages against a
//! [`TrackBuffer`](crate::tracker::TrackBuffer).

mod builder;
mod pipeline;
mod replay;
mod source;

pub use builder::FrameBuilder;
pub use pipeline::{TickStatus, TrackingPipeline};
pub use replay::{OfflineReplay, ReplayError};
pub use source::{FrameSource, SourceRead};

//! Multi-target tracking of mmWave radar point clouds.
//!
//! Per frame the pipeline normalizes raw detections into a world frame,
//! predicts every live track forward, gates and assigns points to tracks,
//! runs each track's state machine and Kalman update, spawns new tracks from
//! density-clustered residuals, and retires quiescent tracks. Consumers read
//! the active track set between frames.

pub mod integration;
pub mod tracker;

pub use integration::{
    FrameBuilder, FrameSource, OfflineReplay, ReplayError, SourceRead, TickStatus,
    TrackingPipeline,
};
pub use tracker::{
    ClusterTrack, ConfigError, Motion, MotionModel, Point, PointCluster, RawFrame, TrackBuffer,
    TrackStatus, TrackerConfig, normalize_frame,
};

mod clustering;
mod config;
mod frame_batch;
mod gating;
mod kalman_filter;
mod motion;
mod normalize;
mod point;
mod track;
mod track_buffer;
mod track_state;

pub use clustering::cluster_points;
pub use config::{ConfigError, TrackerConfig};
pub use frame_batch::FrameBatch;
pub use gating::{AssignmentResult, associate};
pub use kalman_filter::KalmanState;
pub use motion::MotionModel;
pub use normalize::{RawFrame, normalize_frame};
pub use point::{Point, PointCluster};
pub use track::ClusterTrack;
pub use track_buffer::TrackBuffer;
pub use track_state::{Motion, TrackStatus};

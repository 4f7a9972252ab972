//! Tracker configuration.

use thiserror::Error;

use crate::tracker::motion::MotionModel;

/// Configuration for the tracking pipeline.
///
/// One record is threaded from the driver into the [`TrackBuffer`] at
/// construction; nothing reads configuration from ambient state.
///
/// [`TrackBuffer`]: crate::tracker::TrackBuffer
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Motion model selecting the state dimension and `F`/`Q` family.
    pub motion_model: MotionModel,
    /// Measurement noise standard deviation for a single detection.
    pub kf_r_std: f64,
    /// Process noise variance fed to `Q(dt)`.
    pub kf_q_std: f64,
    /// Initial state covariance diagonal.
    pub kf_p_init: f64,
    /// Initial group dispersion diagonal.
    pub kf_group_disp_init: f64,
    /// Smooth the point-count and spread estimates instead of using the
    /// fixed fallback.
    pub kf_enable_est: bool,
    /// Smoothing weight for the point-count estimate.
    pub kf_a_n: f64,
    /// Smoothing weight for the spread estimate.
    pub kf_a_spr: f64,
    /// Typical point count assumed when smoothing is disabled.
    pub kf_est_pointnum: f64,
    /// Per-axis spread clamp `[x, y, z, vx, vy, vz]`; estimates stay within
    /// one to two times these limits.
    pub kf_spread_lim: [f64; 6],
    /// Doppler value above which a point counts as dynamic.
    pub doppler_threshold: f64,
    /// Dynamic point count a track must exceed to receive a measurement
    /// update.
    pub num_dynamic_points_threshold: usize,
    /// Centroid speed below which a cluster is labeled static.
    pub vel_threshold: f64,
    /// Speed below which an unfed dynamic track transitions to static.
    pub min_velocity_stop_no_points: f64,
    /// Speed below which a dynamic track without dynamic points stops.
    pub min_velocity_stop_no_dynamic_points: f64,
    /// Speed below which such a track coasts instead of stopping.
    pub min_velocity_slow_down: f64,
    /// Association gate on the log-det Mahalanobis score.
    pub gate: f64,
    /// Cap on simultaneously active tracks.
    pub max_tracks: usize,
    /// Retirement deadline for dynamic tracks, seconds.
    pub lifetime_dynamic: f64,
    /// Retirement deadline for static tracks, seconds.
    pub lifetime_static: f64,
    /// Scene ceiling in the world frame, meters.
    pub z_threshold: f64,
    /// DBSCAN neighborhood radius.
    pub db_eps: f64,
    /// DBSCAN core-point neighborhood size, the queried point included.
    pub db_min_samples: usize,
    /// Vertical compression of the clustering metric.
    pub db_z_weight: f64,
    /// Range-dependent scaling of the clustering metric.
    pub db_range_weight: f64,
    /// Spawner window size in frames.
    pub frames_batch: usize,
    /// Sensor mounting height, meters.
    pub sensor_height: f64,
    /// Sensor tilt about the x-axis, degrees.
    pub sensor_tilt: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            motion_model: MotionModel::ConstantAcceleration,
            kf_r_std: 0.1,
            kf_q_std: 1.0,
            kf_p_init: 0.1,
            kf_group_disp_init: 0.1,
            kf_enable_est: false,
            kf_a_n: 0.9,
            kf_a_spr: 0.9,
            kf_est_pointnum: 30.0,
            kf_spread_lim: [0.2, 0.2, 2.0, 1.2, 1.2, 0.2],
            doppler_threshold: 0.0,
            num_dynamic_points_threshold: 3,
            vel_threshold: 0.3,
            min_velocity_stop_no_points: 0.04,
            min_velocity_stop_no_dynamic_points: 0.04,
            min_velocity_slow_down: 1.0,
            gate: 4.5,
            max_tracks: 2,
            lifetime_dynamic: 0.5,
            lifetime_static: 5.0,
            z_threshold: 2.5,
            db_eps: 0.3,
            db_min_samples: 40,
            db_z_weight: 0.4,
            db_range_weight: 0.03,
            frames_batch: 1,
            sensor_height: 1.0,
            sensor_tilt: 0.0,
        }
    }
}

impl TrackerConfig {
    /// Check the configuration; errors here are fatal and must abort before
    /// the frame loop starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let state = self.motion_model.state_dim();
        let measurement = self.motion_model.measurement_dim();
        if state < measurement {
            return Err(ConfigError::DimensionMismatch { state, measurement });
        }

        for (name, value) in [
            ("kf_q_std", self.kf_q_std),
            ("kf_p_init", self.kf_p_init),
            ("kf_group_disp_init", self.kf_group_disp_init),
            ("gate", self.gate),
            ("lifetime_dynamic", self.lifetime_dynamic),
            ("lifetime_static", self.lifetime_static),
            ("z_threshold", self.z_threshold),
            ("db_eps", self.db_eps),
            ("vel_threshold", self.vel_threshold),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        for &limit in &self.kf_spread_lim {
            if !(limit > 0.0) {
                return Err(ConfigError::NonPositive {
                    name: "kf_spread_lim",
                    value: limit,
                });
            }
        }

        for (name, weight) in [("kf_a_n", self.kf_a_n), ("kf_a_spr", self.kf_a_spr)] {
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(ConfigError::BadWeight {
                    name,
                    value: weight,
                });
            }
        }

        if !self.kf_enable_est && self.kf_est_pointnum < 1.0 {
            return Err(ConfigError::NonPositive {
                name: "kf_est_pointnum",
                value: self.kf_est_pointnum,
            });
        }

        for (name, count) in [
            ("max_tracks", self.max_tracks),
            ("db_min_samples", self.db_min_samples),
            ("frames_batch", self.frames_batch),
        ] {
            if count == 0 {
                return Err(ConfigError::ZeroCount { name });
            }
        }

        Ok(())
    }
}

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("motion model measures {measurement} components but carries only {state} states")]
    DimensionMismatch { state: usize, measurement: usize },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("`{name}` must be at least 1")]
    ZeroCount { name: &'static str },
    #[error("smoothing weight `{name}` must lie in (0, 1], got {value}")]
    BadWeight { name: &'static str, value: f64 },
}

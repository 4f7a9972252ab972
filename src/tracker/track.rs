//! Point-cluster track with Kalman motion estimation.

use ndarray::{Array2, arr1};

use crate::tracker::config::TrackerConfig;
use crate::tracker::frame_batch::FrameBatch;
use crate::tracker::kalman_filter::KalmanState;
use crate::tracker::point::{Point, PointCluster};
use crate::tracker::track_state::{Motion, TrackStatus};

/// A tracked point cluster.
#[derive(Debug, Clone)]
pub struct ClusterTrack {
    /// Unique identifier, assigned in spawn order.
    pub id: u64,
    /// Most recently associated cluster.
    pub cluster: PointCluster,
    /// Kalman filter state.
    pub state: KalmanState,
    /// Behavioral mode driving prediction and update.
    pub mode: Motion,
    /// Lifecycle flag.
    pub status: TrackStatus,
    /// Seconds since the last association reset.
    pub lifetime: f64,
    /// Smoothed estimate of the typical associated point count.
    pub n_est: f64,
    /// Smoothed per-dimension measurement spread.
    pub spread_est: [f64; 6],
    /// Smoothed dispersion of associated points about their centroid.
    pub group_disp_est: Array2<f64>,
    /// Point count from the most recent association pass.
    pub last_assoc_n: usize,
    /// Dynamic point count from the most recent association pass.
    pub last_assoc_dynamic_n: usize,
    /// Recent associated point sets; read by downstream consumers only,
    /// never by the tracker itself.
    pub batch: FrameBatch,
    /// Stable color assigned at spawn, for visualization.
    pub color: [f32; 3],
}

impl ClusterTrack {
    /// Spawn a track from a cluster of previously unassigned points.
    ///
    /// The track starts dynamic when the cluster carries more dynamic points
    /// than the configured threshold, static otherwise.
    pub fn new(id: u64, cluster: PointCluster, config: &TrackerConfig) -> Self {
        let state = KalmanState::new(
            config.motion_model,
            &cluster.centroid,
            config.kf_p_init,
            config.kf_q_std,
            config.kf_r_std,
        );
        let dynamic_n = count_dynamic(&cluster.points, config.doppler_threshold);
        let mode = if dynamic_n > config.num_dynamic_points_threshold {
            Motion::Dynamic
        } else {
            Motion::Static
        };

        Self {
            id,
            state,
            mode,
            status: TrackStatus::Active,
            lifetime: 0.0,
            n_est: 0.0,
            spread_est: [0.0; 6],
            group_disp_est: Array2::eye(6) * config.kf_group_disp_init,
            last_assoc_n: cluster.point_num,
            last_assoc_dynamic_n: dynamic_n,
            batch: FrameBatch::new(config.frames_batch),
            color: rand::random(),
            cluster,
        }
    }

    /// Planar speed of the a priori state, used by the state machine.
    pub fn planar_speed(&self) -> f64 {
        let x = &self.state.x_prior;
        (x[3] * x[3] + x[4] * x[4]).sqrt()
    }

    /// Advance the filter by `dt` seconds. Static tracks skip prediction;
    /// their prior is the posterior from the previous frame.
    pub fn predict(&mut self, dt: f64) {
        match self.mode {
            Motion::Dynamic => self.state.predict(dt),
            Motion::Static => self.state.hold_prior(),
        }
    }

    /// Record the points the associator routed to this track.
    ///
    /// Any points reset the lifetime, except static noise around a static
    /// track, which lets a quiescent track keep aging toward retirement.
    pub fn observe(&mut self, points: Vec<Point>, dt: f64, config: &TrackerConfig) {
        self.last_assoc_n = points.len();
        self.last_assoc_dynamic_n = count_dynamic(&points, config.doppler_threshold);

        let rejuvenated = self.last_assoc_n > 0
            && !(self.mode == Motion::Static
                && self.last_assoc_dynamic_n <= config.num_dynamic_points_threshold);
        if rejuvenated {
            self.lifetime = 0.0;
        } else {
            self.lifetime += dt;
        }

        if !points.is_empty() {
            self.cluster = PointCluster::new(points, config.vel_threshold);
            self.batch.add_frame(self.cluster.points.clone());
        }
    }

    /// Run the per-frame state machine after association.
    pub fn update_state(&mut self, config: &TrackerConfig) {
        let speed = self.planar_speed();

        if self.last_assoc_n == 0 {
            if self.mode == Motion::Dynamic && speed < config.min_velocity_stop_no_points {
                self.mode = Motion::Static;
            }
            return;
        }

        if self.last_assoc_dynamic_n <= config.num_dynamic_points_threshold {
            // Too little Doppler evidence to trust the centroid as a
            // measurement; static points around a static track are noise.
            if self.mode == Motion::Dynamic {
                if speed < config.min_velocity_stop_no_dynamic_points {
                    self.mode = Motion::Static;
                } else if speed < config.min_velocity_slow_down {
                    // Slow target in a Doppler dropout: hold the predicted
                    // velocity rather than stopping.
                }
                // Fast tracks keep coasting as predicted until Doppler
                // evidence returns.
            }
            return;
        }

        self.mode = Motion::Dynamic;
        let z = self.cluster.centroid;
        let r_c = self.combined_noise();
        self.state.update(&z, &r_c);

        self.estimate_point_num(config);
        self.estimate_measurement_spread(config);
        self.estimate_group_dispersion();

        // Damped snap toward the measurement on a freshly associated track.
        let residual = z[0] - self.state.x[0];
        if self.lifetime == 0.0 && residual.abs() > 0.6 {
            self.state.x[0] += 0.4 * residual;
        }
    }

    /// Measurement covariance from the spread estimate, `diag((spread/2)²)`.
    pub fn measurement_noise(&self) -> Array2<f64> {
        let diag = self.spread_est.map(|s| (s / 2.0) * (s / 2.0));
        Array2::from_diag(&arr1(&diag))
    }

    /// Combined covariance of the cluster centroid as a measurement:
    /// `R_m / N` plus the group dispersion weighted by the share of points
    /// the estimate has not yet explained.
    fn combined_noise(&self) -> Array2<f64> {
        let n = self.cluster.point_num as f64;
        let factor = (self.n_est - n) / ((self.n_est - 1.0) * n);
        let factor = if factor.is_finite() { factor } else { 0.0 };
        self.measurement_noise() / n + &self.group_disp_est * factor
    }

    fn estimate_point_num(&mut self, config: &TrackerConfig) {
        let count = self.cluster.point_num as f64;
        if config.kf_enable_est {
            if count > self.n_est {
                self.n_est = count;
            } else {
                self.n_est = (1.0 - config.kf_a_n) * self.n_est + config.kf_a_n * count;
            }
        } else {
            self.n_est = config.kf_est_pointnum.max(count);
        }
    }

    fn estimate_measurement_spread(&mut self, config: &TrackerConfig) {
        if self.cluster.point_num < 2 {
            return;
        }
        let count = self.cluster.point_num as f64;
        for m in 0..6 {
            // Bias-corrected spread: fewer samples widen the estimate.
            let raw = (self.cluster.max_vals[m] - self.cluster.min_vals[m]) * (count + 1.0)
                / (count - 1.0);
            let limit = config.kf_spread_lim[m];
            let spread = raw.clamp(limit, 2.0 * limit);

            if spread > self.spread_est[m] {
                self.spread_est[m] = spread;
            } else {
                self.spread_est[m] =
                    (1.0 - config.kf_a_spr) * self.spread_est[m] + config.kf_a_spr * spread;
            }
        }
    }

    fn estimate_group_dispersion(&mut self) {
        let a = self.cluster.point_num as f64 / self.n_est;
        let d = self.dispersion();
        self.group_disp_est = &self.group_disp_est * (1.0 - a) + &d * a;
    }

    /// Sample covariance of the cluster's points about their centroid.
    fn dispersion(&self) -> Array2<f64> {
        let mut d = Array2::zeros((6, 6));
        let c = &self.cluster.centroid;
        for point in &self.cluster.points {
            let m = point.measurement();
            for i in 0..6 {
                for j in 0..6 {
                    d[[i, j]] += (m[i] - c[i]) * (m[j] - c[j]);
                }
            }
        }
        d / self.cluster.point_num as f64
    }
}

fn count_dynamic(points: &[Point], doppler_threshold: f64) -> usize {
    points
        .iter()
        .filter(|p| p.doppler > doppler_threshold)
        .count()
}

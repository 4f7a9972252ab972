//! Linear Kalman filter state using ndarray and a nalgebra-based inverse.

use log::warn;
use ndarray::{Array1, Array2};

use crate::tracker::motion::MotionModel;

/// Per-track linear-Gaussian filter.
///
/// Holds both the posterior `(x, P)` and the a priori `(x_prior, P_prior)`
/// captured by the most recent prediction; the associator gates against the
/// priors while updates refine the posterior.
#[derive(Debug, Clone)]
pub struct KalmanState {
    model: MotionModel,
    q_var: f64,
    /// Posterior state mean.
    pub x: Array1<f64>,
    /// Posterior state covariance.
    pub p: Array2<f64>,
    /// A priori state mean.
    pub x_prior: Array1<f64>,
    /// A priori state covariance.
    pub p_prior: Array2<f64>,
    /// Default measurement noise `r_std² · I`; every update rebuilds its own
    /// covariance from the track's spread estimate.
    pub r: Array2<f64>,
    h: Array2<f64>,
}

impl KalmanState {
    /// Initialize from a cluster centroid with covariance `p_init * I`.
    pub fn new(
        model: MotionModel,
        centroid: &[f64; 6],
        p_init: f64,
        q_var: f64,
        r_std: f64,
    ) -> Self {
        let x = model.state_vec(centroid);
        let p = Array2::eye(model.state_dim()) * p_init;
        Self {
            model,
            q_var,
            x_prior: x.clone(),
            p_prior: p.clone(),
            x,
            p,
            r: Array2::eye(model.measurement_dim()) * (r_std * r_std),
            h: model.measurement_matrix(),
        }
    }

    /// Advance the state by `dt` seconds and capture the result as the new
    /// prior.
    pub fn predict(&mut self, dt: f64) {
        let f = self.model.transition(dt);
        let q = self.model.process_noise(dt, self.q_var);

        self.x = f.dot(&self.x);
        self.p = f.dot(&self.p).dot(&f.t()) + q;
        self.x_prior = self.x.clone();
        self.p_prior = self.p.clone();
    }

    /// Capture the current posterior as the prior without advancing it; used
    /// when prediction is skipped for a static track.
    pub fn hold_prior(&mut self) {
        self.x_prior = self.x.clone();
        self.p_prior = self.p.clone();
    }

    /// The measurement the prior predicts, `H · x_prior`.
    pub fn predicted_measurement(&self) -> Array1<f64> {
        self.h.dot(&self.x_prior)
    }

    /// Standard Kalman update of the posterior against `z` with measurement
    /// noise `r`. A singular innovation covariance leaves the posterior
    /// untouched.
    pub fn update(&mut self, z: &[f64; 6], r: &Array2<f64>) {
        let z = Array1::from(z.to_vec());
        let innovation = z - self.h.dot(&self.x);

        let s = self.h.dot(&self.p).dot(&self.h.t()) + r;
        let Some(s_inv) = invert_6x6(&s) else {
            warn!("singular innovation covariance, skipping measurement update");
            return;
        };

        // K = P * H^T * S^-1
        let gain = self.p.dot(&self.h.t()).dot(&s_inv);

        self.x = &self.x + &gain.dot(&innovation);
        self.p = &self.p - &gain.dot(&s).dot(&gain.t());
    }
}

/// Copy a 6x6 ndarray matrix into a nalgebra fixed-size matrix.
pub(crate) fn to_matrix6(m: &Array2<f64>) -> nalgebra::Matrix6<f64> {
    nalgebra::Matrix6::from_fn(|i, j| m[[i, j]])
}

/// Invert a 6x6 matrix using nalgebra (pure Rust); `None` when singular.
pub(crate) fn invert_6x6(m: &Array2<f64>) -> Option<Array2<f64>> {
    let inv = to_matrix6(m).try_inverse()?;
    Some(Array2::from_shape_fn((6, 6), |(i, j)| inv[(i, j)]))
}

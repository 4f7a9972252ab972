//! Interchangeable motion models for the track filter.

use ndarray::{Array1, Array2};

/// Motion model selecting the filter's state dimension and the `F`/`Q`
/// family. Both models measure position plus velocity (six components); the
/// constant-acceleration model carries three extra acceleration states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionModel {
    /// 6-state position/velocity model.
    ConstantVelocity,
    /// 9-state position/velocity/acceleration model.
    #[default]
    ConstantAcceleration,
}

impl MotionModel {
    pub fn state_dim(&self) -> usize {
        match self {
            MotionModel::ConstantVelocity => 6,
            MotionModel::ConstantAcceleration => 9,
        }
    }

    pub fn measurement_dim(&self) -> usize {
        6
    }

    /// Initial state vector seeded from a cluster centroid; higher-order
    /// states start at zero.
    pub fn state_vec(&self, centroid: &[f64; 6]) -> Array1<f64> {
        let mut x = Array1::zeros(self.state_dim());
        for (i, &c) in centroid.iter().enumerate() {
            x[i] = c;
        }
        x
    }

    /// State transition matrix `F(dt)`.
    pub fn transition(&self, dt: f64) -> Array2<f64> {
        let mut f = Array2::eye(self.state_dim());
        match self {
            MotionModel::ConstantVelocity => {
                for i in 0..3 {
                    f[[i, i + 3]] = dt;
                }
            }
            MotionModel::ConstantAcceleration => {
                for i in 0..3 {
                    f[[i, i + 3]] = dt;
                    f[[i, i + 6]] = 0.5 * dt * dt;
                    f[[i + 3, i + 6]] = dt;
                }
            }
        }
        f
    }

    /// Discrete white-noise process covariance `Q(dt)` with variance `var`.
    ///
    /// Noise enters through the highest-order state derivative, so
    /// `Q(0) = 0` for both models.
    pub fn process_noise(&self, dt: f64, var: f64) -> Array2<f64> {
        match self {
            MotionModel::ConstantVelocity => block_noise(&[0.5 * dt * dt, dt], var),
            MotionModel::ConstantAcceleration => {
                block_noise(&[dt * dt * dt / 6.0, 0.5 * dt * dt, dt], var)
            }
        }
    }

    /// Measurement matrix `H` selecting position and velocity.
    pub fn measurement_matrix(&self) -> Array2<f64> {
        let mut h = Array2::zeros((self.measurement_dim(), self.state_dim()));
        for i in 0..self.measurement_dim() {
            h[[i, i]] = 1.0;
        }
        h
    }
}

/// Expand a per-axis noise coupling vector into the full `Q` matrix.
///
/// The state is laid out as `[pos3, vel3, (acc3)]`, so each entry of the
/// per-axis block `g·gᵀ·var` lands on the diagonal of the corresponding 3x3
/// sub-block.
fn block_noise(g: &[f64], var: f64) -> Array2<f64> {
    let n = g.len() * 3;
    let mut q = Array2::zeros((n, n));
    for (a, &ga) in g.iter().enumerate() {
        for (b, &gb) in g.iter().enumerate() {
            let v = ga * gb * var;
            for axis in 0..3 {
                q[[a * 3 + axis, b * 3 + axis]] = v;
            }
        }
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims() {
        assert_eq!(MotionModel::ConstantVelocity.state_dim(), 6);
        assert_eq!(MotionModel::ConstantAcceleration.state_dim(), 9);
        assert_eq!(MotionModel::ConstantAcceleration.measurement_dim(), 6);
    }

    #[test]
    fn test_transition_advances_position() {
        let f = MotionModel::ConstantAcceleration.transition(0.5);
        assert_eq!(f[[0, 3]], 0.5);
        assert_eq!(f[[0, 6]], 0.125);
        assert_eq!(f[[3, 6]], 0.5);
        assert_eq!(f[[6, 6]], 1.0);
    }

    #[test]
    fn test_zero_dt_transition_is_identity() {
        for model in [
            MotionModel::ConstantVelocity,
            MotionModel::ConstantAcceleration,
        ] {
            let f = model.transition(0.0);
            assert_eq!(f, Array2::eye(model.state_dim()));
        }
    }

    #[test]
    fn test_zero_dt_process_noise_vanishes() {
        for model in [
            MotionModel::ConstantVelocity,
            MotionModel::ConstantAcceleration,
        ] {
            let q = model.process_noise(0.0, 1.0);
            assert!(q.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_state_vec_seeds_measured_components() {
        let x = MotionModel::ConstantAcceleration.state_vec(&[1.0, 2.0, 3.0, 0.1, 0.2, 0.3]);
        assert_eq!(x.len(), 9);
        assert_eq!(x[2], 3.0);
        assert_eq!(x[5], 0.3);
        assert_eq!(x[8], 0.0);
    }
}

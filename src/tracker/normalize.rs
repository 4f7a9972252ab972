//! Raw-frame normalization into the world frame.

use log::debug;

use crate::tracker::config::TrackerConfig;
use crate::tracker::point::Point;

/// One sensor frame as parallel per-detection arrays.
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub doppler: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl RawFrame {
    /// Detection count; the shortest array bounds it when the arrays
    /// disagree.
    pub fn len(&self) -> usize {
        self.x
            .len()
            .min(self.y.len())
            .min(self.z.len())
            .min(self.doppler.len())
            .min(self.intensity.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a raw frame into world-frame points.
///
/// Each detection's radial speed is decomposed along its ray, the sensor
/// tilt rotation and height translation are applied as one rigid transform
/// (rotation only for velocity), and points failing the scene gates
/// (`0 < z ≤ z_threshold`, `y > 0`) or carrying non-finite values are
/// silently dropped.
pub fn normalize_frame(frame: &RawFrame, config: &TrackerConfig) -> Vec<Point> {
    let n = frame.len();
    let (sin_t, cos_t) = config.sensor_tilt.to_radians().sin_cos();

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let (x, y, z) = (frame.x[i], frame.y[i], frame.z[i]);
        let (doppler, intensity) = (frame.doppler[i], frame.intensity[i]);
        if [x, y, z, doppler, intensity].iter().any(|v| !v.is_finite()) {
            debug!("dropping non-finite detection record {i}");
            continue;
        }

        let r = (x * x + y * y + z * z).sqrt();
        let (vx, vy, vz) = if r == 0.0 {
            (0.0, doppler, 0.0)
        } else {
            (doppler * x / r, doppler * y / r, doppler * z / r)
        };

        // Tilt rotation about the x-axis, then height translation along z.
        let wy = cos_t * y - sin_t * z;
        let wz = sin_t * y + cos_t * z + config.sensor_height;
        let wvy = cos_t * vy - sin_t * vz;
        let wvz = sin_t * vy + cos_t * vz;

        if wz <= 0.0 || wz > config.z_threshold || wy <= 0.0 {
            continue;
        }

        points.push(Point::new(x, wy, wz, vx, wvy, wvz, doppler, intensity));
    }
    points
}

use crate::tracker::track_state::Motion;

/// A single normalized radar detection in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Cartesian velocity along the detection ray, x component.
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// Raw radial speed; positive away from the sensor.
    pub doppler: f64,
    /// Signal intensity reported by the sensor.
    pub intensity: f64,
}

impl Point {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: f64,
        y: f64,
        z: f64,
        vx: f64,
        vy: f64,
        vz: f64,
        doppler: f64,
        intensity: f64,
    ) -> Self {
        Self {
            x,
            y,
            z,
            vx,
            vy,
            vz,
            doppler,
            intensity,
        }
    }

    /// The six measured components: position followed by velocity.
    #[inline]
    pub fn measurement(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.vx, self.vy, self.vz]
    }
}

/// A non-empty set of points with derived attributes.
///
/// The centroid, per-dimension extrema and motion label cover the six
/// measured components only; doppler and intensity ride along in `points`.
#[derive(Debug, Clone)]
pub struct PointCluster {
    pub points: Vec<Point>,
    pub point_num: usize,
    pub centroid: [f64; 6],
    pub min_vals: [f64; 6],
    pub max_vals: [f64; 6],
    /// Whether the centroid moves quickly enough to count as dynamic.
    pub motion: Motion,
}

impl PointCluster {
    /// Derive cluster attributes from `points`; callers guarantee the set is
    /// non-empty.
    pub fn new(points: Vec<Point>, vel_threshold: f64) -> Self {
        debug_assert!(!points.is_empty());

        let point_num = points.len();
        let mut centroid = [0.0; 6];
        let mut min_vals = [f64::INFINITY; 6];
        let mut max_vals = [f64::NEG_INFINITY; 6];

        for point in &points {
            let m = point.measurement();
            for i in 0..6 {
                centroid[i] += m[i];
                min_vals[i] = min_vals[i].min(m[i]);
                max_vals[i] = max_vals[i].max(m[i]);
            }
        }
        for c in &mut centroid {
            *c /= point_num as f64;
        }

        let speed =
            (centroid[3] * centroid[3] + centroid[4] * centroid[4] + centroid[5] * centroid[5])
                .sqrt();
        let motion = if speed < vel_threshold {
            Motion::Static
        } else {
            Motion::Dynamic
        };

        Self {
            points,
            point_num,
            centroid,
            min_vals,
            max_vals,
            motion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(x: f64, y: f64, z: f64, vy: f64) -> Point {
        Point::new(x, y, z, 0.0, vy, 0.0, vy, 10.0)
    }

    #[test]
    fn test_cluster_attributes() {
        let cluster = PointCluster::new(
            vec![
                point_at(0.0, 1.0, 1.0, 0.0),
                point_at(0.2, 1.2, 0.8, 0.0),
                point_at(0.4, 0.8, 1.2, 0.0),
            ],
            0.3,
        );

        assert_eq!(cluster.point_num, 3);
        assert!((cluster.centroid[0] - 0.2).abs() < 1e-12);
        assert!((cluster.centroid[1] - 1.0).abs() < 1e-12);
        assert_eq!(cluster.min_vals[2], 0.8);
        assert_eq!(cluster.max_vals[2], 1.2);
    }

    #[test]
    fn test_motion_label_thresholds() {
        let slow = PointCluster::new(vec![point_at(0.0, 1.0, 1.0, 0.2)], 0.3);
        assert_eq!(slow.motion, Motion::Static);

        let fast = PointCluster::new(vec![point_at(0.0, 1.0, 1.0, 0.5)], 0.3);
        assert_eq!(fast.motion, Motion::Dynamic);
    }
}

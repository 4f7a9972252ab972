//! Density-based clustering of unassigned points.

use crate::tracker::config::TrackerConfig;
use crate::tracker::point::Point;

const UNCLASSIFIED: i32 = -2;
const NOISE: i32 = -1;

/// Weighted squared-Euclidean clustering metric.
///
/// Vertical spread is compressed so tall, thin silhouettes stay in one
/// cluster, and the result shrinks with range so the sparser far-field
/// returns still reach core density.
fn weighted_distance(p: &Point, q: &Point, z_weight: f64, range_weight: f64) -> f64 {
    let weight = 1.0 - 0.5 * (p.y + q.y) * range_weight;
    weight
        * ((p.x - q.x).powi(2) + (p.y - q.y).powi(2) + z_weight * (p.z - q.z).powi(2))
}

/// DBSCAN over the weighted metric; noise points are discarded.
///
/// Core points need `db_min_samples` neighbors within `db_eps`, the point
/// itself included; clusters grow by density reachability. The region query
/// is a linear scan, which is fine at the buffer sizes involved.
pub fn cluster_points(points: &[Point], config: &TrackerConfig) -> Vec<Vec<Point>> {
    let mut labels = vec![UNCLASSIFIED; points.len()];
    let mut cluster_id = 0;

    for i in 0..points.len() {
        if labels[i] != UNCLASSIFIED {
            continue;
        }

        let neighbors = region_query(points, i, config);
        if neighbors.len() < config.db_min_samples {
            labels[i] = NOISE;
            continue;
        }

        labels[i] = cluster_id;
        let mut seeds: Vec<usize> = neighbors;
        while let Some(j) = seeds.pop() {
            if labels[j] == NOISE {
                // Border point reached by a core point.
                labels[j] = cluster_id;
            }
            if labels[j] != UNCLASSIFIED {
                continue;
            }
            labels[j] = cluster_id;

            let expansion = region_query(points, j, config);
            if expansion.len() >= config.db_min_samples {
                seeds.extend(expansion);
            }
        }
        cluster_id += 1;
    }

    let mut clusters = vec![Vec::new(); cluster_id as usize];
    for (point, &label) in points.iter().zip(&labels) {
        if label >= 0 {
            clusters[label as usize].push(*point);
        }
    }
    clusters
}

fn region_query(points: &[Point], center: usize, config: &TrackerConfig) -> Vec<usize> {
    let p = &points[center];
    (0..points.len())
        .filter(|&j| {
            weighted_distance(p, &points[j], config.db_z_weight, config.db_range_weight)
                <= config.db_eps
        })
        .collect()
}

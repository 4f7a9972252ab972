//! Measurement-to-track gating and greedy assignment.

use log::debug;
use ndarray::{Array1, Array2, s};

use crate::tracker::kalman_filter::{invert_6x6, to_matrix6};
use crate::tracker::point::Point;
use crate::tracker::track::ClusterTrack;

/// Outcome of one association pass. Every input point lands in exactly one
/// bucket or in the residual.
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    /// Points routed to each track, indexed like the input track slice.
    pub assigned: Vec<Vec<Point>>,
    /// Points no gate accepted.
    pub unassigned: Vec<Point>,
}

/// Per-track quantities reused across every point of the frame.
struct TrackGate {
    predicted: Array1<f64>,
    inverse: Array2<f64>,
    log_det: f64,
}

impl TrackGate {
    /// Bidding score: `log|det C| + yᵀ C⁻¹ y`. The log-det term penalizes
    /// tracks with broad predicted covariance so they do not absorb every
    /// point.
    fn score(&self, measurement: &[f64; 6]) -> f64 {
        let y: Array1<f64> = measurement
            .iter()
            .zip(self.predicted.iter())
            .map(|(m, h)| m - h)
            .collect();
        self.log_det + y.dot(&self.inverse.dot(&y))
    }
}

fn track_gate(track: &ClusterTrack) -> Option<TrackGate> {
    let c = track.state.p_prior.slice(s![..6, ..6]).to_owned()
        + track.measurement_noise()
        + &track.group_disp_est;

    let det = to_matrix6(&c).determinant();
    if !det.is_finite() || det.abs() <= f64::MIN_POSITIVE {
        return None;
    }
    let inverse = invert_6x6(&c)?;

    Some(TrackGate {
        predicted: track.state.predicted_measurement(),
        inverse,
        log_det: det.abs().ln(),
    })
}

/// Score every point against every track and route each point to the
/// closest gated track; ties break toward the lower track index. Tracks
/// with a degenerate gate covariance accept nothing this frame.
pub fn associate(tracks: &[ClusterTrack], points: &[Point], gate: f64) -> AssignmentResult {
    let gates: Vec<Option<TrackGate>> = tracks
        .iter()
        .map(|track| {
            let g = track_gate(track);
            if g.is_none() {
                debug!(
                    "track {}: degenerate gate covariance, ungated this frame",
                    track.id
                );
            }
            g
        })
        .collect();

    let mut assigned = vec![Vec::new(); tracks.len()];
    let mut unassigned = Vec::new();

    for &point in points {
        let measurement = point.measurement();
        let mut best: Option<(usize, f64)> = None;

        for (j, track_gate) in gates.iter().enumerate() {
            let Some(g) = track_gate else { continue };
            let score = g.score(&measurement);
            if score < gate && best.map_or(true, |(_, s)| score < s) {
                best = Some((j, score));
            }
        }

        match best {
            Some((j, _)) => assigned[j].push(point),
            None => unassigned.push(point),
        }
    }

    AssignmentResult {
        assigned,
        unassigned,
    }
}

//! Ownership and per-frame orchestration of all live tracks.

use log::debug;

use crate::tracker::clustering;
use crate::tracker::config::TrackerConfig;
use crate::tracker::frame_batch::FrameBatch;
use crate::tracker::gating;
use crate::tracker::point::{Point, PointCluster};
use crate::tracker::track::ClusterTrack;
use crate::tracker::track_state::{Motion, TrackStatus};

/// Owner of all live tracks and the spawner's frame window.
///
/// Tracks are held exclusively by value and addressed by their stable id;
/// consumers read the track set between frames and never mutate it.
#[derive(Debug)]
pub struct TrackBuffer {
    tracks: Vec<ClusterTrack>,
    next_track_id: u64,
    frame_batch: FrameBatch,
    config: TrackerConfig,
    dt: f64,
}

impl TrackBuffer {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_track_id: 0,
            frame_batch: FrameBatch::new(config.frames_batch),
            config,
            dt: 0.0,
        }
    }

    /// Active tracks, readable between frames.
    pub fn tracks(&self) -> &[ClusterTrack] {
        &self.tracks
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Delta supplied with the most recent frame, seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Unassigned points currently buffered for the spawner.
    pub fn pending_points(&self) -> usize {
        self.frame_batch.len()
    }

    /// Run one full pipeline step over a normalized frame:
    /// predict, associate, update, spawn, retire.
    ///
    /// An empty frame still advances prediction and aging by `dt` but skips
    /// association, update and spawning.
    pub fn step(&mut self, points: &[Point], dt: f64) {
        self.dt = dt;

        for track in &mut self.tracks {
            track.predict(dt);
        }

        if points.is_empty() {
            for track in &mut self.tracks {
                track.lifetime += dt;
            }
            self.retire();
            return;
        }

        let result = gating::associate(&self.tracks, points, self.config.gate);
        debug_assert_eq!(
            result.assigned.iter().map(Vec::len).sum::<usize>() + result.unassigned.len(),
            points.len(),
        );
        for (track, bucket) in self.tracks.iter_mut().zip(result.assigned) {
            track.observe(bucket, dt, &self.config);
        }

        for track in &mut self.tracks {
            track.update_state(&self.config);
        }

        self.spawn(result.unassigned);
        self.retire();
    }

    /// Buffer the frame's residual points and promote dense clusters to new
    /// tracks while the track cap leaves room.
    fn spawn(&mut self, unassigned: Vec<Point>) {
        self.frame_batch.add_frame(unassigned);
        if self.frame_batch.is_empty() || self.tracks.len() >= self.config.max_tracks {
            return;
        }

        let clusters = clustering::cluster_points(&self.frame_batch.effective(), &self.config);
        if clusters.is_empty() {
            return;
        }
        self.frame_batch.clear();

        for points in clusters {
            if self.tracks.len() >= self.config.max_tracks {
                debug!(
                    "track cap reached, dropping a cluster of {} points",
                    points.len()
                );
                continue;
            }
            let cluster = PointCluster::new(points, self.config.vel_threshold);
            let track = ClusterTrack::new(self.next_track_id, cluster, &self.config);
            debug!(
                "spawned track {} with {} points ({:?})",
                track.id, track.cluster.point_num, track.mode
            );
            self.next_track_id += 1;
            self.tracks.push(track);
        }
    }

    /// Drop tracks whose quiescent lifetime exceeds the mobility-dependent
    /// deadline.
    fn retire(&mut self) {
        for track in &mut self.tracks {
            let deadline = match track.mode {
                Motion::Dynamic => self.config.lifetime_dynamic,
                Motion::Static => self.config.lifetime_static,
            };
            if track.lifetime > deadline {
                track.status = TrackStatus::Inactive;
                debug!(
                    "retiring track {} after {:.2}s without association",
                    track.id, track.lifetime
                );
            }
        }
        self.tracks.retain(|track| track.status == TrackStatus::Active);
    }
}

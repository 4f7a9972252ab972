use approx::assert_relative_eq;
use pointtrack_rs::tracker::{
    ClusterTrack, Motion, MotionModel, Point, PointCluster, TrackBuffer, TrackerConfig, associate,
    normalize_frame,
};
use pointtrack_rs::{FrameBuilder, RawFrame};

fn test_config() -> TrackerConfig {
    TrackerConfig {
        motion_model: MotionModel::ConstantAcceleration,
        gate: 4.5,
        max_tracks: 2,
        vel_threshold: 0.3,
        num_dynamic_points_threshold: 3,
        doppler_threshold: 0.0,
        db_eps: 0.3,
        db_min_samples: 3,
        sensor_height: 0.0,
        sensor_tilt: 0.0,
        ..TrackerConfig::default()
    }
}

/// Four detections within a 0.1 m box around `center`.
fn box_frame(center: [f64; 3], doppler: [f64; 4]) -> RawFrame {
    let offsets = [
        [-0.05, -0.05, -0.05],
        [0.05, -0.05, 0.05],
        [-0.05, 0.05, 0.05],
        [0.05, 0.05, -0.05],
    ];
    let mut builder = FrameBuilder::new();
    for (off, d) in offsets.iter().zip(doppler) {
        builder = builder.detection(
            center[0] + off[0],
            center[1] + off[1],
            center[2] + off[2],
            d,
            20.0,
        );
    }
    builder.build()
}

fn step_frame(buffer: &mut TrackBuffer, frame: &RawFrame, dt: f64) -> usize {
    let points = normalize_frame(frame, buffer.config());
    let n = points.len();
    buffer.step(&points, dt);
    n
}

#[test]
fn test_cold_start_spawns_single_dynamic_track() {
    let mut buffer = TrackBuffer::new(test_config());

    let n = step_frame(
        &mut buffer,
        &box_frame([0.0, 1.0, 1.0], [0.5, 0.6, 0.4, 0.55]),
        0.1,
    );
    assert_eq!(n, 4);

    assert_eq!(buffer.tracks().len(), 1);
    let track = &buffer.tracks()[0];
    assert_eq!(track.id, 0);
    assert_eq!(track.mode, Motion::Dynamic);
    assert_relative_eq!(track.cluster.centroid[0], 0.0, epsilon = 1e-9);
    assert_relative_eq!(track.cluster.centroid[1], 1.0, epsilon = 1e-9);
    assert_relative_eq!(track.cluster.centroid[2], 1.0, epsilon = 1e-9);

    // The whole cluster was promoted; nothing lingers in the spawn window.
    assert_eq!(buffer.pending_points(), 0);
}

#[test]
fn test_association_continues_the_track() {
    let mut buffer = TrackBuffer::new(test_config());
    let doppler = [0.5, 0.6, 0.4, 0.55];

    step_frame(&mut buffer, &box_frame([0.0, 1.0, 1.0], doppler), 0.1);
    step_frame(&mut buffer, &box_frame([0.05, 1.0, 1.0], doppler), 0.1);

    assert_eq!(buffer.tracks().len(), 1);
    let track = &buffer.tracks()[0];
    assert_eq!(track.id, 0);
    assert_eq!(track.lifetime, 0.0);

    // The posterior moved toward the new centroid and carries velocity.
    assert!(track.state.x[0] > 0.0);
    assert!(track.state.x[0] < 0.05);
    let speed = (track.state.x[3].powi(2) + track.state.x[4].powi(2)).sqrt();
    assert!(speed > 0.0);
}

#[test]
fn test_static_track_never_updates_and_retires() {
    let mut config = test_config();
    config.lifetime_static = 0.35;
    let mut buffer = TrackBuffer::new(config);

    step_frame(&mut buffer, &box_frame([0.0, 1.0, 1.0], [0.0; 4]), 0.1);
    assert_eq!(buffer.tracks().len(), 1);
    assert_eq!(buffer.tracks()[0].mode, Motion::Static);

    for frame_i in 1..5 {
        step_frame(&mut buffer, &box_frame([0.0, 1.0, 1.0], [0.0; 4]), 0.1);

        if let Some(track) = buffer.tracks().first() {
            // Static mode: no prediction, no update, lifetime keeps growing.
            assert_eq!(track.state.x, track.state.x_prior);
            assert_relative_eq!(track.lifetime, 0.1 * frame_i as f64, epsilon = 1e-9);
            assert_relative_eq!(track.state.x[0], 0.0, epsilon = 1e-9);
        } else {
            assert!(frame_i >= 4);
        }
    }

    // 0.4 s without dynamic evidence exceeds the static deadline.
    assert!(buffer.tracks().is_empty());
}

#[test]
fn test_gate_rejects_distant_point() {
    let mut buffer = TrackBuffer::new(test_config());
    step_frame(
        &mut buffer,
        &box_frame([0.0, 1.0, 1.0], [0.5, 0.6, 0.4, 0.55]),
        0.1,
    );

    let frame = FrameBuilder::new().detection(5.0, 5.0, 1.0, 0.0, 20.0).build();
    step_frame(&mut buffer, &frame, 0.1);

    assert_eq!(buffer.tracks().len(), 1);
    let track = &buffer.tracks()[0];
    assert_eq!(track.last_assoc_n, 0);
    assert!(track.lifetime > 0.0);

    // The rejected point waits in the spawn window; one point is below the
    // clustering density, so no track came of it.
    assert_eq!(buffer.pending_points(), 1);
}

#[test]
fn test_track_cap_blocks_spawning() {
    let mut buffer = TrackBuffer::new(test_config());
    let doppler = [0.5, 0.6, 0.4, 0.55];

    let mut first = box_frame([0.0, 1.0, 1.0], doppler);
    let second = box_frame([1.5, 1.0, 1.0], doppler);
    first.x.extend(second.x);
    first.y.extend(second.y);
    first.z.extend(second.z);
    first.doppler.extend(second.doppler);
    first.intensity.extend(second.intensity);

    step_frame(&mut buffer, &first, 0.1);
    assert_eq!(buffer.tracks().len(), 2);
    let ids: Vec<u64> = buffer.tracks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![0, 1]);

    // A fresh distant cluster arrives while the cap is saturated.
    let mut third = FrameBuilder::new();
    for i in 0..5 {
        third = third.detection(-3.0 + 0.03 * i as f64, 1.0, 1.0, 0.5, 20.0);
    }
    step_frame(&mut buffer, &third.build(), 0.1);

    assert_eq!(buffer.tracks().len(), 2);
    assert_eq!(buffer.tracks().iter().map(|t| t.id).max(), Some(1));
    // The cluster stays buffered until a spawn eventually clears the window.
    assert_eq!(buffer.pending_points(), 5);
}

#[test]
fn test_dual_gate_tie_breaks_to_lower_index() {
    let config = test_config();
    let points: Vec<Point> = (0..4)
        .map(|i| {
            let off = 0.02 * i as f64;
            Point::new(off, 1.0 + off, 1.0, 0.0, 0.0, 0.0, 0.0, 20.0)
        })
        .collect();

    // Identical init: both tracks share prior mean and covariance.
    let first = ClusterTrack::new(0, PointCluster::new(points.clone(), 0.3), &config);
    let second = ClusterTrack::new(1, PointCluster::new(points, 0.3), &config);
    let centroid = first.cluster.centroid;
    let probe = Point::new(
        centroid[0], centroid[1], centroid[2], centroid[3], centroid[4], centroid[5], 0.0, 20.0,
    );

    let result = associate(&[first, second], &[probe], config.gate);
    assert_eq!(result.assigned[0].len(), 1);
    assert!(result.assigned[1].is_empty());
    assert!(result.unassigned.is_empty());
}

#[test]
fn test_starved_track_keeps_its_last_committed_state() {
    let mut buffer = TrackBuffer::new(test_config());
    step_frame(
        &mut buffer,
        &box_frame([0.0, 1.0, 1.0], [0.5, 0.6, 0.4, 0.55]),
        0.1,
    );
    let id = buffer.tracks()[0].id;
    let y0 = buffer.tracks()[0].state.x[1];
    let vy0 = buffer.tracks()[0].state.x[4];

    // Frames with no surviving detections: prediction drifts the track but
    // association and update never run.
    buffer.step(&[], 0.1);
    buffer.step(&[], 0.1);

    assert_eq!(buffer.tracks().len(), 1);
    let track = &buffer.tracks()[0];
    assert_eq!(track.id, id);
    assert!(track.lifetime >= 0.2);
    // Drift covers exactly the elapsed 0.2 s at the spawn velocity.
    assert_relative_eq!(track.state.x[1], y0 + 0.2 * vy0, epsilon = 1e-9);
}

/// Behavioral motion label for clusters and tracks.
///
/// A cluster is labeled by its centroid speed; a track's mode additionally
/// drives whether prediction and measurement updates run at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Motion {
    /// Not moving; the filter holds its last posterior.
    #[default]
    Static,
    /// Moving target with an active filter.
    Dynamic,
}

/// Track lifecycle flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackStatus {
    /// Participates in association and is visible to consumers.
    #[default]
    Active,
    /// Retired; released from the track buffer.
    Inactive,
}

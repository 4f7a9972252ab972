//! Fixed-capacity sliding window of per-frame point sets.

use std::collections::VecDeque;

use crate::tracker::point::Point;

/// Sliding window over the most recent frames' point arrays.
///
/// The spawner clusters over its concatenation; tracks keep one as a
/// read-only batch of their recently associated points.
#[derive(Debug, Clone)]
pub struct FrameBatch {
    frames: VecDeque<Vec<Point>>,
    capacity: usize,
}

impl FrameBatch {
    /// A window spanning `frames_batch` frames.
    pub fn new(frames_batch: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: frames_batch + 1,
        }
    }

    /// Append one frame, evicting the oldest frames beyond the window.
    pub fn add_frame(&mut self, points: Vec<Point>) {
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(points);
    }

    /// All buffered points, oldest frame first.
    pub fn effective(&self) -> Vec<Point> {
        self.frames.iter().flatten().copied().collect()
    }

    /// Total buffered point count.
    pub fn len(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_STACK_SLICES;

/// Wall point relative to the vessel-ROI centre, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallPoint {
    pub x: f64,
    pub y: f64,
}

/// Inner-wall points detected in one processed frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallPointSlice {
    /// One-based processed-frame count at which the slice was taken.
    pub frame_index: u64,
    pub points: Vec<WallPoint>,
}

/// Bounded FIFO of wall-point slices; the oldest slice is dropped first.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloudStack {
    slices: VecDeque<WallPointSlice>,
    capacity: usize,
}

impl Default for PointCloudStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudStack {
    pub fn new() -> Self {
        Self::with_capacity(MAX_STACK_SLICES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slices: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, slice: WallPointSlice) {
        self.slices.push_back(slice);
        while self.slices.len() > self.capacity {
            self.slices.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.slices.iter().map(|s| s.points.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WallPointSlice> {
        self.slices.iter()
    }

    /// Oldest-first view of the most recent `window` slices.
    pub fn window(&self, window: usize) -> Vec<&WallPointSlice> {
        let start = self.slices.len().saturating_sub(window);
        self.slices.range(start..).collect()
    }

    /// Mutable oldest-first view of the most recent `window` slices.
    pub fn window_mut(&mut self, window: usize) -> impl Iterator<Item = &mut WallPointSlice> {
        let start = self.slices.len().saturating_sub(window);
        self.slices.range_mut(start..)
    }

    /// Deep copy of every slice, oldest first.
    pub fn snapshot(&self) -> Vec<WallPointSlice> {
        self.slices.iter().cloned().collect()
    }

    /// Replace the contents with `slices`, keeping the newest when over capacity.
    pub fn restore(&mut self, slices: Vec<WallPointSlice>) {
        self.slices.clear();
        for slice in slices {
            self.push(slice);
        }
    }

    pub fn clear(&mut self) {
        self.slices.clear();
    }
}

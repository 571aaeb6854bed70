use serde::{Deserialize, Serialize};

/// Running stress totals for one angular sector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorBin {
    pub sum_signed_wss: f64,
    pub sum_abs_wss: f64,
    pub count: u64,
    pub max_wss: f64,
    /// Zero-based processed-frame index at which `max_wss` was observed.
    pub max_frame: u64,
}

impl SectorBin {
    /// Add one stress sample with flow direction `dir` (+1 / -1).
    #[inline]
    pub fn record(&mut self, stress: f64, dir: f64, frame: u64) {
        self.sum_abs_wss += stress;
        self.sum_signed_wss += stress * dir;
        self.count += 1;
        if stress > self.max_wss {
            self.max_wss = stress;
            self.max_frame = frame;
        }
    }

    /// Fold another bin's totals into this one.
    pub fn merge(&mut self, other: &SectorBin) {
        self.sum_abs_wss += other.sum_abs_wss;
        self.sum_signed_wss += other.sum_signed_wss;
        self.count += other.count;
        if other.max_wss > self.max_wss {
            self.max_wss = other.max_wss;
            self.max_frame = other.max_frame;
        }
    }
}

/// Sector index of pixel `(x, y)` around centre `(cx, cy)`.
///
/// The angle is `atan2(y - cy, x - cx)` in degrees, normalised to [0, 360).
/// Returns `None` for non-finite angles so the sample is dropped.
#[inline]
pub fn sector_index(x: f64, y: f64, cx: f64, cy: f64, sector_count: usize) -> Option<usize> {
    if sector_count == 0 {
        return None;
    }
    let mut angle = (y - cy).atan2(x - cx).to_degrees();
    if !angle.is_finite() {
        return None;
    }
    if angle < 0.0 {
        angle += 360.0;
    }
    let width = 360.0 / sector_count as f64;
    Some((angle / width).floor() as usize % sector_count)
}

/// Start angle (degrees) of sector `index`.
pub fn sector_angle(index: usize, sector_count: usize) -> f64 {
    index as f64 * (360.0 / sector_count as f64)
}

/// Session-wide array of `sector_count` bins.
#[derive(Clone, Debug, PartialEq)]
pub struct SectorAccumulator {
    bins: Vec<SectorBin>,
}

impl SectorAccumulator {
    /// A zero sector count is raised to one so the array is never empty.
    pub fn new(sector_count: usize) -> Self {
        Self {
            bins: vec![SectorBin::default(); sector_count.max(1)],
        }
    }

    pub fn sector_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[SectorBin] {
        &self.bins
    }

    pub fn bin(&self, index: usize) -> Option<&SectorBin> {
        self.bins.get(index)
    }

    /// Record a sample in sector `index`. Out-of-range indices are dropped
    /// and reported as `false`.
    pub fn record(&mut self, index: usize, stress: f64, dir: f64, frame: u64) -> bool {
        match self.bins.get_mut(index) {
            Some(bin) => {
                bin.record(stress, dir, frame);
                true
            }
            None => false,
        }
    }

    /// Merge a partial bin array produced by one scan chunk. Extra entries
    /// beyond this accumulator's length are dropped.
    pub fn merge(&mut self, partial: &[SectorBin]) {
        for (bin, other) in self.bins.iter_mut().zip(partial) {
            if other.count > 0 {
                bin.merge(other);
            }
        }
    }

    /// Total samples across all sectors.
    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn clear(&mut self) {
        self.bins.fill(SectorBin::default());
    }
}

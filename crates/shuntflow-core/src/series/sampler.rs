use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_TIME_SERIES_SAMPLES;

/// One periodic reading of the session's derived signals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    /// One-based processed-frame count at which the sample was taken.
    pub frame_index: u64,
    /// Source timestamp, when the source reports one.
    pub time_sec: Option<f64>,
    pub avg_wss: f64,
    /// Flow area in px², or cm² when calibrated.
    pub area: f64,
    /// Raw mean red value of red flow pixels; normalised at classification.
    pub pressure_proxy: f64,
}

/// Bounded buffer of time-series samples, oldest dropped first.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesSampler {
    samples: VecDeque<TimeSeriesSample>,
    capacity: usize,
}

impl Default for TimeSeriesSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesSampler {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TIME_SERIES_SAMPLES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, sample: TimeSeriesSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesSample> {
        self.samples.iter()
    }

    pub fn samples(&self) -> Vec<TimeSeriesSample> {
        self.samples.iter().cloned().collect()
    }

    pub fn avg_wss(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.avg_wss).collect()
    }

    pub fn areas(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.area).collect()
    }

    /// Pressure proxy divided by its maximum over the buffer. All-zero
    /// (or empty) series stay zero.
    pub fn normalized_pressure(&self) -> Vec<f64> {
        let max = self
            .samples
            .iter()
            .map(|s| s.pressure_proxy)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        self.samples
            .iter()
            .map(|s| {
                if max > 0.0 {
                    s.pressure_proxy / max
                } else {
                    0.0
                }
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

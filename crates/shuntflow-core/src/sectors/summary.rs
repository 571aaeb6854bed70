//! End-of-session hemodynamic indices per sector.
//!
//! TAWSS is the mean absolute stress of the sector, OSI measures how much of
//! that stress reverses direction (0 = unidirectional, 0.5 = fully
//! oscillating) and RRT is the inverse of the net unidirectional stress.

use serde::{Deserialize, Serialize};

use crate::consts::{RRT_MIN_DENOMINATOR, RRT_SENTINEL};

use super::accumulator::{sector_angle, SectorAccumulator, SectorBin};

/// Derived indices of one sector. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorResult {
    pub angle: f64,
    pub tawss: f64,
    pub osi: f64,
    pub rrt: f64,
    pub max_wss: f64,
    pub max_frame: u64,
}

/// Indices for a single bin starting at `angle` degrees.
pub fn summarize_bin(angle: f64, bin: &SectorBin) -> SectorResult {
    if bin.count == 0 {
        return SectorResult {
            angle,
            tawss: 0.0,
            osi: 0.0,
            rrt: 0.0,
            max_wss: 0.0,
            max_frame: 0,
        };
    }

    let tawss = bin.sum_abs_wss / bin.count as f64;
    let osi = if bin.sum_abs_wss > 0.0 {
        (0.5 * (1.0 - bin.sum_signed_wss.abs() / bin.sum_abs_wss)).clamp(0.0, 0.5)
    } else {
        0.0
    };
    let denominator = (1.0 - 2.0 * osi) * tawss;
    let rrt = if denominator > RRT_MIN_DENOMINATOR {
        1.0 / denominator
    } else {
        RRT_SENTINEL
    };

    SectorResult {
        angle,
        tawss: if tawss.is_finite() { tawss } else { 0.0 },
        osi,
        rrt: if rrt.is_finite() { rrt } else { RRT_SENTINEL },
        max_wss: bin.max_wss,
        max_frame: bin.max_frame,
    }
}

/// Finalize every sector of the accumulator, in angle order.
pub fn summarize(accumulator: &SectorAccumulator) -> Vec<SectorResult> {
    let n = accumulator.sector_count();
    accumulator
        .bins()
        .iter()
        .enumerate()
        .map(|(i, bin)| summarize_bin(sector_angle(i, n), bin))
        .collect()
}

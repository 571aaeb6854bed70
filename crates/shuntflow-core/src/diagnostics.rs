//! Plain-language findings derived from the finalized sector results and
//! the sampled area series.

use serde::{Deserialize, Serialize};

use crate::consts::{
    ELEVATED_MEAN_TAWSS, HIGH_SHEAR_MAX_OSI, HIGH_TAWSS, LOW_DISTENSIBILITY, STAGNATION_RRT,
};
use crate::sectors::SectorResult;

/// Side of the vessel a sector angle points to (0° = right, 90° = bottom).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallDirection {
    Right,
    Bottom,
    Left,
    Top,
}

impl WallDirection {
    pub fn from_angle(angle: f64) -> Self {
        if angle >= 315.0 || angle < 45.0 {
            Self::Right
        } else if angle < 135.0 {
            Self::Bottom
        } else if angle < 225.0 {
            Self::Left
        } else {
            Self::Top
        }
    }
}

impl std::fmt::Display for WallDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Right => write!(f, "right"),
            Self::Bottom => write!(f, "bottom"),
            Self::Left => write!(f, "left"),
            Self::Top => write!(f, "top"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    HighShear,
    Stagnation,
    Normal,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighShear => write!(f, "High Shear"),
            Self::Stagnation => write!(f, "Stagnation"),
            Self::Normal => write!(f, "Normal"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub angle: Option<f64>,
    /// Frame to seek to for review, when the finding has one.
    pub frame: Option<u64>,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Highest-TAWSS sector among those above the high-WSS threshold.
    pub peak_sector: Option<(f64, WallDirection)>,
    pub mean_tawss: f64,
    pub elevated_mean: bool,
    /// `(max_area - min_area) / min_area`; `None` without samples.
    pub distensibility: Option<f64>,
    pub sector_comment: String,
    pub trend_comment: String,
    pub findings: Vec<Finding>,
}

fn max_by_metric<'a>(
    results: impl Iterator<Item = &'a SectorResult>,
    metric: impl Fn(&SectorResult) -> f64,
) -> Option<&'a SectorResult> {
    results.max_by(|a, b| metric(a).total_cmp(&metric(b)))
}

/// Summarise sector results and the sampled `areas` series.
pub fn diagnose(results: &[SectorResult], areas: &[f64]) -> DiagnosticReport {
    let peak = max_by_metric(results.iter().filter(|r| r.tawss > HIGH_TAWSS), |r| r.tawss);
    let peak_sector = peak.map(|r| (r.angle, WallDirection::from_angle(r.angle)));
    let sector_comment = match peak_sector {
        Some((angle, dir)) => format!("High WSS around {angle}° ({dir} wall)"),
        None => "No notable high-WSS region".to_string(),
    };

    let mean_tawss = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.tawss).sum::<f64>() / results.len() as f64
    };
    let elevated_mean = mean_tawss > ELEVATED_MEAN_TAWSS;
    let mut trend_comment = if elevated_mean {
        "WSS is elevated overall.".to_string()
    } else {
        "Average WSS level.".to_string()
    };

    let finite_areas = areas.iter().copied().filter(|a| a.is_finite());
    let distensibility = finite_areas
        .clone()
        .reduce(f64::min)
        .zip(finite_areas.reduce(f64::max))
        .map(|(min, max)| if min > 0.0 { (max - min) / min } else { 0.0 });
    if let Some(d) = distensibility {
        if d < LOW_DISTENSIBILITY {
            trend_comment.push_str(" Wall distensibility may be reduced (low compliance).");
        } else {
            trend_comment.push_str(" Good pulsatile variation.");
        }
    }

    let mut findings = Vec::new();
    if let Some(r) = max_by_metric(
        results
            .iter()
            .filter(|r| r.tawss > HIGH_TAWSS && r.osi < HIGH_SHEAR_MAX_OSI),
        |r| r.tawss,
    ) {
        findings.push(Finding {
            kind: FindingKind::HighShear,
            angle: Some(r.angle),
            frame: Some(r.max_frame),
            description: format!("High stress around {}°", r.angle),
        });
    }
    if let Some(r) = max_by_metric(results.iter().filter(|r| r.rrt > STAGNATION_RRT), |r| r.rrt) {
        findings.push(Finding {
            kind: FindingKind::Stagnation,
            angle: Some(r.angle),
            frame: None,
            description: format!("Residence-time risk around {}°", r.angle),
        });
    }
    if findings.is_empty() {
        findings.push(Finding {
            kind: FindingKind::Normal,
            angle: None,
            frame: None,
            description: "No abnormality".to_string(),
        });
    }

    DiagnosticReport {
        peak_sector,
        mean_tawss,
        elevated_mean,
        distensibility,
        sector_comment,
        trend_comment,
        findings,
    }
}

/// Playback time of `frame` in a stream of `total_frames` lasting `duration_sec`.
pub fn frame_seek_time(frame: u64, total_frames: u64, duration_sec: f64) -> Option<f64> {
    (total_frames > 0 && duration_sec.is_finite())
        .then(|| frame as f64 / total_frames as f64 * duration_sec)
}

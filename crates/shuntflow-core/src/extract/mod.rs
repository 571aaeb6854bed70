//! Stress-field extraction from colour-coded flow frames.

pub mod classify;
pub mod overlay;
pub mod stress;
pub mod wall;

use image::RgbaImage;

use crate::cloud::WallPoint;
use crate::config::AnalysisConfig;
use crate::frame::RgbaFrame;
use crate::sectors::SectorAccumulator;

pub use classify::{classify, FlowClass, FlowVector};
pub use overlay::stress_color;
pub use stress::{scan_stress_field, stress_from_velocity, FrameStats, StressScan};
pub use wall::detect_inner_wall;

/// Flow centroid in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

impl Centroid {
    /// Geometric centre of a `width` x `height` frame, used before any flow was seen.
    pub fn frame_center(width: usize, height: usize) -> Self {
        Self {
            x: width as f64 / 2.0,
            y: height as f64 / 2.0,
        }
    }
}

/// Everything one frame contributes to the session.
#[derive(Clone, Debug)]
pub struct FrameExtraction {
    pub overlay: RgbaImage,
    pub stats: FrameStats,
    /// Centroid of this frame's flow pixels; `None` keeps the previous one.
    pub centroid: Option<Centroid>,
    /// Inner-wall points, present only when requested.
    pub wall_points: Option<Vec<WallPoint>>,
}

/// Run the extractor on one frame.
///
/// Sector binning uses `previous_centroid` (the last frame that had flow),
/// falling back to the frame centre; the centroid measured here only takes
/// effect on the next frame.
pub fn extract_frame(
    frame: &RgbaFrame,
    config: &AnalysisConfig,
    previous_centroid: Option<Centroid>,
    frame_index: u64,
    sectors: &mut SectorAccumulator,
    detect_walls: bool,
) -> FrameExtraction {
    let centre =
        previous_centroid.unwrap_or_else(|| Centroid::frame_center(frame.width(), frame.height()));

    let wall_points = detect_walls
        .then(|| detect_inner_wall(frame, config.vessel_roi.as_ref(), config.wall_threshold));

    let StressScan { overlay, stats } =
        scan_stress_field(frame, config, centre, frame_index, sectors);
    let centroid = stats.flow_centroid();

    FrameExtraction {
        overlay,
        stats,
        centroid,
        wall_points,
    }
}

//! Per-pixel wall-shear-stress proxy.
//!
//! Flow pixels only feed the next centroid. Neutral pixels next to flow are
//! treated as wall contact: the strongest 4-connected flow neighbour gives a
//! velocity proxy `v` and the stress is `min(255, v * (v / 255 * k))`.

use image::RgbaImage;
use rayon::prelude::*;

use crate::config::{AnalysisConfig, PixelRect};
use crate::consts::{MAX_STRESS, PARALLEL_PIXEL_THRESHOLD, RGBA_CHANNELS};
use crate::frame::RgbaFrame;
use crate::sectors::{sector_index, SectorAccumulator, SectorBin};

use super::classify::{classify, FlowClass, FlowVector};
use super::overlay::stress_color;
use super::Centroid;

/// Quadratic velocity-to-stress law, clamped to 255.
#[inline]
pub fn stress_from_velocity(velocity: u8, multiplier: f32) -> f64 {
    let v = velocity as f64;
    (v * (v / 255.0 * multiplier as f64)).min(MAX_STRESS)
}

/// Per-frame totals of one stress scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub total_stress: f64,
    pub max_stress: f64,
    pub stress_pixels: usize,
    pub flow_pixels: usize,
    pub flow_sum_x: f64,
    pub flow_sum_y: f64,
    /// Sum of the red channel over red-classified flow pixels.
    pub red_value_sum: f64,
    pub red_pixels: usize,
    /// Interior pixels visited by the scan.
    pub scanned_pixels: usize,
}

impl FrameStats {
    fn merge(&mut self, other: &FrameStats) {
        self.total_stress += other.total_stress;
        self.max_stress = self.max_stress.max(other.max_stress);
        self.stress_pixels += other.stress_pixels;
        self.flow_pixels += other.flow_pixels;
        self.flow_sum_x += other.flow_sum_x;
        self.flow_sum_y += other.flow_sum_y;
        self.red_value_sum += other.red_value_sum;
        self.red_pixels += other.red_pixels;
        self.scanned_pixels += other.scanned_pixels;
    }

    /// Mean stress over stress pixels, 0 when there were none.
    pub fn avg_stress(&self) -> f64 {
        if self.stress_pixels > 0 {
            self.total_stress / self.stress_pixels as f64
        } else {
            0.0
        }
    }

    /// Mean red value over red flow pixels, 0 when there were none.
    pub fn mean_red(&self) -> f64 {
        if self.red_pixels > 0 {
            self.red_value_sum / self.red_pixels as f64
        } else {
            0.0
        }
    }

    /// Centroid of this frame's flow pixels.
    pub fn flow_centroid(&self) -> Option<Centroid> {
        (self.flow_pixels > 0).then(|| Centroid {
            x: self.flow_sum_x / self.flow_pixels as f64,
            y: self.flow_sum_y / self.flow_pixels as f64,
        })
    }
}

/// Overlay raster and totals of one frame.
#[derive(Clone, Debug)]
pub struct StressScan {
    pub overlay: RgbaImage,
    pub stats: FrameStats,
}

struct ScanContext<'a> {
    frame: &'a RgbaFrame,
    rect: PixelRect,
    threshold: f32,
    multiplier: f32,
    centre: Centroid,
    sector_count: usize,
    frame_index: u64,
}

struct RowPartial {
    stats: FrameStats,
    bins: Vec<SectorBin>,
}

/// Scan the flow ROI (1 px border excluded), binning stress around `centre`.
///
/// `centre` is the previous frame's flow centroid; sector samples land in
/// `sectors` and the overlay marks every stress pixel.
pub fn scan_stress_field(
    frame: &RgbaFrame,
    config: &AnalysisConfig,
    centre: Centroid,
    frame_index: u64,
    sectors: &mut SectorAccumulator,
) -> StressScan {
    let w = frame.width();
    let h = frame.height();
    if w == 0 || h == 0 {
        return StressScan {
            overlay: RgbaImage::new(w as u32, h as u32),
            stats: FrameStats::default(),
        };
    }
    let rect = PixelRect::resolve(config.flow_roi.as_ref(), w, h);
    let ctx = ScanContext {
        frame,
        rect,
        threshold: config.color_threshold,
        multiplier: config.stress_multiplier,
        centre,
        sector_count: sectors.sector_count(),
        frame_index,
    };

    let stride = w * RGBA_CHANNELS;
    let mut overlay = vec![0u8; stride * h];
    let y_start = rect.y0 + 1;
    let y_end = rect.y1.saturating_sub(1);

    let partials: Vec<RowPartial> = if y_end <= y_start {
        Vec::new()
    } else {
        let rows = &mut overlay[y_start * stride..y_end * stride];
        if rect.width() * rect.height() >= PARALLEL_PIXEL_THRESHOLD {
            rows.par_chunks_mut(stride)
                .enumerate()
                .map(|(i, out_row)| scan_row(&ctx, y_start + i, out_row))
                .collect()
        } else {
            rows.chunks_mut(stride)
                .enumerate()
                .map(|(i, out_row)| scan_row(&ctx, y_start + i, out_row))
                .collect()
        }
    };

    // Merge in row order so totals do not depend on the thread schedule.
    let mut stats = FrameStats::default();
    for partial in &partials {
        stats.merge(&partial.stats);
        sectors.merge(&partial.bins);
    }

    let overlay = RgbaImage::from_raw(w as u32, h as u32, overlay)
        .unwrap_or_else(|| RgbaImage::new(w as u32, h as u32));
    StressScan { overlay, stats }
}

fn scan_row(ctx: &ScanContext<'_>, y: usize, out_row: &mut [u8]) -> RowPartial {
    let mut stats = FrameStats::default();
    let mut bins = vec![SectorBin::default(); ctx.sector_count];
    let x_start = ctx.rect.x0 + 1;
    let x_end = ctx.rect.x1.saturating_sub(1);
    let at = |x: usize, y: usize| classify(ctx.frame.rgb(x, y), ctx.threshold);

    for x in x_start..x_end {
        stats.scanned_pixels += 1;
        let flow = at(x, y);
        if flow.is_flow() {
            stats.flow_pixels += 1;
            stats.flow_sum_x += x as f64;
            stats.flow_sum_y += y as f64;
            if flow.class == FlowClass::Red {
                stats.red_pixels += 1;
                stats.red_value_sum += flow.value as f64;
            }
            continue;
        }

        let mut strongest = FlowVector::NEUTRAL;
        for neighbor in [at(x + 1, y), at(x - 1, y), at(x, y + 1), at(x, y - 1)] {
            if neighbor.value > strongest.value {
                strongest = neighbor;
            }
        }
        if strongest.value == 0 {
            continue;
        }

        let stress = stress_from_velocity(strongest.value, ctx.multiplier);
        stats.total_stress += stress;
        stats.max_stress = stats.max_stress.max(stress);
        stats.stress_pixels += 1;

        if let Some(idx) = sector_index(x as f64, y as f64, ctx.centre.x, ctx.centre.y, ctx.sector_count) {
            if let Some(bin) = bins.get_mut(idx) {
                bin.record(stress, strongest.dir(), ctx.frame_index);
            }
        }

        let o = x * RGBA_CHANNELS;
        out_row[o..o + RGBA_CHANNELS].copy_from_slice(&stress_color(stress));
    }

    RowPartial { stats, bins }
}

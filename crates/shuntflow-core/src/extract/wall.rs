use crate::cloud::WallPoint;
use crate::config::{NormRect, PixelRect};
use crate::consts::{WALL_INNER_RATIO, WALL_NEIGHBOR_RADIUS, WALL_SCAN_STRIDE};
use crate::frame::RgbaFrame;

#[inline]
fn brightness(rgb: [u8; 3]) -> f32 {
    (rgb[0] as f32 + rgb[1] as f32 + rgb[2] as f32) / 3.0
}

/// Detect inner vessel-wall pixels inside the vessel ROI.
///
/// Bright pixels (above `wall_threshold`) sampled at stride 2 become wall
/// points when any neighbour on the stride-2 grid within radius 3 is darker
/// than `wall_threshold * 0.8`, i.e. they border the lumen. Coordinates are
/// relative to the ROI centre.
pub fn detect_inner_wall(
    frame: &RgbaFrame,
    vessel_roi: Option<&NormRect>,
    wall_threshold: f32,
) -> Vec<WallPoint> {
    let w = frame.width();
    let h = frame.height();
    let rect = PixelRect::resolve(vessel_roi, w, h);
    let (cx, cy) = rect.center();
    let inner_cutoff = wall_threshold * WALL_INNER_RATIO;

    let mut points = Vec::new();
    for y in (rect.y0..rect.y1).step_by(WALL_SCAN_STRIDE) {
        for x in (rect.x0..rect.x1).step_by(WALL_SCAN_STRIDE) {
            if brightness(frame.rgb(x, y)) <= wall_threshold {
                continue;
            }
            if borders_lumen(frame, x, y, inner_cutoff) {
                points.push(WallPoint {
                    x: x as f64 - cx,
                    y: y as f64 - cy,
                });
            }
        }
    }
    points
}

fn borders_lumen(frame: &RgbaFrame, x: usize, y: usize, inner_cutoff: f32) -> bool {
    let w = frame.width() as isize;
    let h = frame.height() as isize;
    let offsets = (-WALL_NEIGHBOR_RADIUS..=WALL_NEIGHBOR_RADIUS).step_by(WALL_SCAN_STRIDE);
    for oy in offsets.clone() {
        for ox in offsets.clone() {
            if ox == 0 && oy == 0 {
                continue;
            }
            let nx = x as isize + ox;
            let ny = y as isize + oy;
            if nx < 0 || nx >= w || ny < 0 || ny >= h {
                continue;
            }
            if brightness(frame.rgb(nx as usize, ny as usize)) < inner_cutoff {
                return true;
            }
        }
    }
    false
}

use crate::consts::OVERLAY_RAMP_SPLIT;

/// Overlay colour of a stress value: green→yellow below 100, yellow→red above.
pub fn stress_color(stress: f64) -> [u8; 4] {
    let to_u8 = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    if stress < OVERLAY_RAMP_SPLIT {
        [to_u8(stress * 2.5), 255, 0, 255]
    } else {
        [255, to_u8(255.0 - (stress - OVERLAY_RAMP_SPLIT) * 1.6), 0, 255]
    }
}

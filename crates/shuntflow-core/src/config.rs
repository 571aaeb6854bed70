use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_COLOR_THRESHOLD, DEFAULT_NOISE_FILTER_LEVEL, DEFAULT_ROTATION,
    DEFAULT_SECTOR_COUNT, DEFAULT_STRESS_MULTIPLIER, DEFAULT_WALL_THRESHOLD,
    MAX_NOISE_FILTER_LEVEL, MIN_ROI_EXTENT,
};
use crate::error::{Result, ShuntError};
use crate::series::stenosis::StenosisConfig;

/// Rectangle in normalised frame coordinates, all fields in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl NormRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rectangle from a drag gesture between two normalised points.
    ///
    /// Dragging up or left is flipped into a positive extent. Returns `None`
    /// when either side is below `MIN_ROI_EXTENT`, which clears the ROI.
    pub fn from_drag(start: (f64, f64), end: (f64, f64)) -> Option<Self> {
        let (mut x, mut y) = start;
        let mut w = end.0 - start.0;
        let mut h = end.1 - start.1;
        if w < 0.0 {
            x += w;
            w = w.abs();
        }
        if h < 0.0 {
            y += h;
            h = h.abs();
        }
        if w < MIN_ROI_EXTENT || h < MIN_ROI_EXTENT {
            None
        } else {
            Some(Self { x, y, w, h })
        }
    }

    /// Zero or negative area (or non-finite fields).
    pub fn is_degenerate(&self) -> bool {
        !(self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0)
    }

    /// Pixel bounds within a `width` x `height` frame, clamped to the frame.
    pub fn to_pixels(&self, width: usize, height: usize) -> PixelRect {
        let fw = width as f64;
        let fh = height as f64;
        let clamp = |v: f64, max: usize| -> usize {
            if v.is_finite() {
                (v.floor().max(0.0) as usize).min(max)
            } else {
                0
            }
        };
        PixelRect {
            x0: clamp(self.x * fw, width),
            y0: clamp(self.y * fh, height),
            x1: clamp((self.x + self.w) * fw, width),
            y1: clamp((self.y + self.h) * fh, height),
        }
    }
}

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x0 + self.x1) as f64 / 2.0,
            (self.y0 + self.y1) as f64 / 2.0,
        )
    }

    /// Resolve an optional ROI to pixel bounds, clipped to the frame. Unset,
    /// zero-area or fully off-frame ROIs fall back to the whole frame.
    pub fn resolve(roi: Option<&NormRect>, width: usize, height: usize) -> Self {
        match roi {
            Some(r) if !r.is_degenerate() => {
                let px = r.to_pixels(width, height);
                if px.is_empty() {
                    Self::full(width, height)
                } else {
                    px
                }
            }
            _ => Self::full(width, height),
        }
    }
}

/// Live-mutable analysis parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Margin by which the dominant channel must exceed the other two.
    #[serde(default = "default_color_threshold")]
    pub color_threshold: f32,
    /// Brightness above which a pixel may belong to the vessel wall.
    #[serde(default = "default_wall_threshold")]
    pub wall_threshold: f32,
    /// Gain of the quadratic velocity-to-stress law.
    #[serde(default = "default_stress_multiplier")]
    pub stress_multiplier: f32,
    /// Number of angular sectors. Changing it re-creates the accumulator.
    #[serde(default = "default_sector_count")]
    pub sector_count: usize,
    #[serde(default)]
    pub flow_roi: Option<NormRect>,
    #[serde(default)]
    pub vessel_roi: Option<NormRect>,
    /// Pixels per centimetre; 0 means uncalibrated (areas in px²).
    #[serde(default)]
    pub scale_px_per_cm: f64,
}

fn default_color_threshold() -> f32 {
    DEFAULT_COLOR_THRESHOLD
}
fn default_wall_threshold() -> f32 {
    DEFAULT_WALL_THRESHOLD
}
fn default_stress_multiplier() -> f32 {
    DEFAULT_STRESS_MULTIPLIER
}
fn default_sector_count() -> usize {
    DEFAULT_SECTOR_COUNT
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            color_threshold: DEFAULT_COLOR_THRESHOLD,
            wall_threshold: DEFAULT_WALL_THRESHOLD,
            stress_multiplier: DEFAULT_STRESS_MULTIPLIER,
            sector_count: DEFAULT_SECTOR_COUNT,
            flow_roi: None,
            vessel_roi: None,
            scale_px_per_cm: 0.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sector_count == 0 {
            return Err(ShuntError::InvalidConfig(
                "sector_count must be greater than 0".into(),
            ));
        }
        if !self.scale_px_per_cm.is_finite() || self.scale_px_per_cm < 0.0 {
            return Err(ShuntError::InvalidConfig(format!(
                "scale_px_per_cm must be a finite value >= 0 (got {})",
                self.scale_px_per_cm
            )));
        }
        for (name, value) in [
            ("color_threshold", self.color_threshold),
            ("wall_threshold", self.wall_threshold),
            ("stress_multiplier", self.stress_multiplier),
        ] {
            if !value.is_finite() {
                return Err(ShuntError::InvalidConfig(format!(
                    "{name} must be finite (got {value})"
                )));
            }
        }
        for (name, roi) in [("flow_roi", &self.flow_roi), ("vessel_roi", &self.vessel_roi)] {
            if let Some(r) = roi {
                if ![r.x, r.y, r.w, r.h].iter().all(|v| v.is_finite()) {
                    return Err(ShuntError::InvalidConfig(format!(
                        "{name} must have finite bounds (got {r:?})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Area of `pixel_count` pixels in the configured unit.
    pub fn area_from_pixels(&self, pixel_count: usize) -> f64 {
        if self.scale_px_per_cm > 0.0 {
            pixel_count as f64 / (self.scale_px_per_cm * self.scale_px_per_cm)
        } else {
            pixel_count as f64
        }
    }

    pub fn area_unit(&self) -> AreaUnit {
        if self.scale_px_per_cm > 0.0 {
            AreaUnit::SquareCentimeters
        } else {
            AreaUnit::SquarePixels
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    SquarePixels,
    SquareCentimeters,
}

impl std::fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SquarePixels => write!(f, "px²"),
            Self::SquareCentimeters => write!(f, "cm²"),
        }
    }
}

/// Scale in pixels per centimetre from two normalised points spanning 1 cm.
pub fn calibrate_from_points(p1: (f64, f64), p2: (f64, f64), width: u32, height: u32) -> f64 {
    let dx = (p1.0 - p2.0) * width as f64;
    let dy = (p1.1 - p2.1) * height as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Initial state of the interactive 3D view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Pitch and yaw in radians.
    #[serde(default = "default_rotation")]
    pub initial_rotation: [f64; 2],
    /// Neighbour filter level, 0 (off) to 3.
    #[serde(default = "default_noise_filter_level")]
    pub noise_filter_level: u8,
}

fn default_rotation() -> [f64; 2] {
    [DEFAULT_ROTATION, DEFAULT_ROTATION]
}
fn default_noise_filter_level() -> u8 {
    DEFAULT_NOISE_FILTER_LEVEL
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            initial_rotation: default_rotation(),
            noise_filter_level: DEFAULT_NOISE_FILTER_LEVEL,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.noise_filter_level > MAX_NOISE_FILTER_LEVEL {
            return Err(ShuntError::InvalidConfig(format!(
                "noise_filter_level must be 0..={MAX_NOISE_FILTER_LEVEL} (got {})",
                self.noise_filter_level
            )));
        }
        Ok(())
    }
}

/// Everything a session needs, loadable from a single TOML document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub stenosis: StenosisConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.stenosis.validate()?;
        self.viewer.validate()
    }
}

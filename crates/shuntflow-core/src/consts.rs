/// Minimum scanned pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Bytes per RGBA8 pixel.
pub const RGBA_CHANNELS: usize = 4;

/// Default RGB dominance margin for red/blue flow classification.
pub const DEFAULT_COLOR_THRESHOLD: f32 = 40.0;

/// Default brightness threshold for vessel-wall detection.
pub const DEFAULT_WALL_THRESHOLD: f32 = 50.0;

/// Default gain of the quadratic velocity-to-stress law.
pub const DEFAULT_STRESS_MULTIPLIER: f32 = 2.5;

/// Default number of angular sectors around the flow centroid.
pub const DEFAULT_SECTOR_COUNT: usize = 36;

/// Upper clamp of the per-pixel stress proxy.
pub const MAX_STRESS: f64 = 255.0;

/// Stress value where the overlay ramp switches from green→yellow to yellow→red.
pub const OVERLAY_RAMP_SPLIT: f64 = 100.0;

/// Pixel stride of the vessel-wall scan and of its neighbour window.
pub const WALL_SCAN_STRIDE: usize = 2;

/// Neighbour window radius (pixels) of the vessel-wall scan.
pub const WALL_NEIGHBOR_RADIUS: isize = 3;

/// Neighbour brightness below `wall_threshold * WALL_INNER_RATIO` marks an inner-wall pixel.
pub const WALL_INNER_RATIO: f32 = 0.8;

/// A wall-point slice is appended every this many processed frames.
pub const SLICE_CADENCE: u64 = 2;

/// A time-series sample is recorded every this many processed frames.
pub const SAMPLE_CADENCE: u64 = 6;

/// Maximum number of live wall-point slices in the point-cloud stack.
pub const MAX_STACK_SLICES: usize = 120;

/// Maximum number of retained time-series samples.
pub const MAX_TIME_SERIES_SAMPLES: usize = 240;

/// Maximum depth of the point-cloud undo history.
pub const MAX_UNDO_DEPTH: usize = 5;

/// Rendered slice window of the enlarged 3D view.
pub const ENLARGED_WINDOW: usize = 300;

/// Rendered slice window of the inline 3D preview.
pub const INLINE_WINDOW: usize = 100;

/// Depth spacing between consecutive slices in the enlarged view.
pub const ENLARGED_DEPTH_STEP: f64 = 3.0;

/// Depth spacing between consecutive slices in the inline preview.
pub const INLINE_DEPTH_STEP: f64 = 2.0;

/// Fixed projection scale of the inline preview.
pub const INLINE_SCALE: f64 = 0.5;

/// Perspective camera distance along the depth axis.
pub const CAMERA_DISTANCE: f64 = 400.0;

/// Radians of rotation per pixel of pointer drag.
pub const ROTATION_PER_PIXEL: f64 = 0.01;

/// Default pitch/yaw of a fresh 3D view (radians).
pub const DEFAULT_ROTATION: f64 = 0.5;

/// Zoom limits and multiplicative step of the enlarged view.
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_STEP: f64 = 1.1;

/// Highest noise-filter level; neighbour search range is `level * NOISE_FILTER_RANGE_PER_LEVEL` px.
pub const MAX_NOISE_FILTER_LEVEL: u8 = 3;
pub const NOISE_FILTER_RANGE_PER_LEVEL: f64 = 3.0;

/// Default noise-filter level of a fresh 3D view.
pub const DEFAULT_NOISE_FILTER_LEVEL: u8 = 1;

/// RRT reported when `(1 - 2*OSI) * TAWSS` is at or below `RRT_MIN_DENOMINATOR`.
pub const RRT_SENTINEL: f64 = 100.0;
pub const RRT_MIN_DENOMINATOR: f64 = 0.01;

/// Minimum number of samples (and valid pairs) for the stenosis features.
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// Peak indices within this many samples count as simultaneous.
pub const PEAK_SYNC_TOLERANCE: usize = 1;

/// Smallest normalised ROI side accepted from a drag gesture.
pub const MIN_ROI_EXTENT: f64 = 0.01;

/// Average stress above which the realtime evaluation reads HIGH / WARN.
pub const REALTIME_HIGH_WSS: f64 = 80.0;
pub const REALTIME_WARN_WSS: f64 = 40.0;

/// Sector TAWSS above which diagnostics report high shear.
pub const HIGH_TAWSS: f64 = 80.0;

/// Sector OSI below which a high-TAWSS sector counts as unidirectional high shear.
pub const HIGH_SHEAR_MAX_OSI: f64 = 0.2;

/// Sector RRT above which diagnostics report stagnation risk.
pub const STAGNATION_RRT: f64 = 0.5;

/// Session mean TAWSS above which the trend comment reads elevated.
pub const ELEVATED_MEAN_TAWSS: f64 = 60.0;

/// Area distensibility below which compliance is reported as low.
pub const LOW_DISTENSIBILITY: f64 = 0.1;

/// SER timestamps count 100 ns ticks.
pub const SER_TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Frame rate assumed for sources that carry no timing information.
pub const DEFAULT_FPS: f64 = 30.0;

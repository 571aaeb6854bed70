//! Pseudo-3D view of the wall-point stack.
//!
//! Depth encodes recency: slice `idx` of a window of `len` slices sits at
//! `z = (idx - len / 2) * depth_step`. Points are rotated by pitch then yaw,
//! perspective-divided with a camera at distance 400, then scaled and
//! offset to screen space.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::ViewerConfig;
use crate::consts::{
    CAMERA_DISTANCE, ENLARGED_DEPTH_STEP, ENLARGED_WINDOW, INLINE_DEPTH_STEP, INLINE_SCALE,
    INLINE_WINDOW, MAX_NOISE_FILTER_LEVEL, MAX_UNDO_DEPTH, MAX_ZOOM, MIN_ZOOM,
    NOISE_FILTER_RANGE_PER_LEVEL, ROTATION_PER_PIXEL, ZOOM_STEP,
};

use super::stack::{PointCloudStack, WallPoint, WallPointSlice};

/// Which rendering surface a projection is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    /// Full-size interactive view: pan, zoom and deletion apply.
    Enlarged,
    /// Small preview: fixed scale, no pan.
    Inline,
}

impl ViewKind {
    pub fn window(&self) -> usize {
        match self {
            Self::Enlarged => ENLARGED_WINDOW,
            Self::Inline => INLINE_WINDOW,
        }
    }

    pub fn depth_step(&self) -> f64 {
        match self {
            Self::Enlarged => ENLARGED_DEPTH_STEP,
            Self::Inline => INLINE_DEPTH_STEP,
        }
    }
}

/// Size of the rendering surface in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// What a pointer drag does in the view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Rotate,
    Move,
    Delete,
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rotate => write!(f, "Rotate"),
            Self::Move => write!(f, "Move"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Axis-aligned screen rectangle, bounds inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ScreenRect {
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Persistent view parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Rotation about the x axis, radians.
    pub pitch: f64,
    /// Rotation about the y axis, radians.
    pub yaw: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub noise_filter_level: u8,
    pub mode: InteractionMode,
}

impl ViewState {
    fn from_config(config: &ViewerConfig) -> Self {
        Self {
            pitch: config.initial_rotation[0],
            yaw: config.initial_rotation[1],
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            noise_filter_level: config.noise_filter_level.min(MAX_NOISE_FILTER_LEVEL),
            mode: InteractionMode::default(),
        }
    }
}

/// Rotate `(x, y, z)` by `pitch` about x, then by `yaw` about y.
#[inline]
pub fn rotate_point(x: f64, y: f64, z: f64, pitch: f64, yaw: f64) -> (f64, f64, f64) {
    let (sin_p, cos_p) = pitch.sin_cos();
    let (sin_y, cos_y) = yaw.sin_cos();
    let y1 = y * cos_p - z * sin_p;
    let z1 = y * sin_p + z * cos_p;
    let x2 = x * cos_y + z1 * sin_y;
    let z2 = -x * sin_y + z1 * cos_y;
    (x2, y1, z2)
}

/// A wall point in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    /// Rotated depth; larger is closer to the camera.
    pub depth: f64,
    pub perspective: f64,
}

/// One slice of a rendered window.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedSlice {
    pub frame_index: u64,
    /// Suggested opacity, 0.2 for the oldest slice rising towards 1.0.
    pub alpha: f64,
    pub points: Vec<ProjectedPoint>,
}

/// Screen transform for one view kind and the current view state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionTransform {
    pub center_x: f64,
    pub center_y: f64,
    pub scale: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl ProjectionTransform {
    pub fn new(view: &ViewState, kind: ViewKind, viewport: Viewport) -> Self {
        let (pan_x, pan_y, scale) = match kind {
            ViewKind::Enlarged => (view.pan_x, view.pan_y, view.zoom),
            ViewKind::Inline => (0.0, 0.0, INLINE_SCALE),
        };
        Self {
            center_x: viewport.width / 2.0 + pan_x,
            center_y: viewport.height / 2.0 + pan_y,
            scale,
            pitch: view.pitch,
            yaw: view.yaw,
        }
    }

    /// Project a point at depth `z`. Points at or behind the camera plane
    /// (`z_rot >= 400`) have no projection.
    pub fn project(&self, point: &WallPoint, z: f64) -> Option<ProjectedPoint> {
        let (rx, ry, rz) = rotate_point(point.x, point.y, z, self.pitch, self.yaw);
        if !(rz < CAMERA_DISTANCE) {
            return None;
        }
        let perspective = CAMERA_DISTANCE / (CAMERA_DISTANCE - rz);
        let x = self.center_x + rx * self.scale * perspective;
        let y = self.center_y + ry * self.scale * perspective;
        (x.is_finite() && y.is_finite()).then_some(ProjectedPoint {
            x,
            y,
            depth: rz,
            perspective,
        })
    }
}

/// Depth of slice `idx` in a window of `len` slices.
#[inline]
pub fn slice_depth(idx: usize, len: usize, depth_step: f64) -> f64 {
    (idx as f64 - len as f64 / 2.0) * depth_step
}

/// Whether `point` has a neighbour in an adjacent slice within `range` px on both axes.
fn has_adjacent_neighbor(
    window: &[&WallPointSlice],
    idx: usize,
    point: &WallPoint,
    range: f64,
) -> bool {
    let near = |slice: &WallPointSlice| {
        slice
            .points
            .iter()
            .any(|q| (q.x - point.x).abs() < range && (q.y - point.y).abs() < range)
    };
    (idx > 0 && near(window[idx - 1])) || (idx + 1 < window.len() && near(window[idx + 1]))
}

/// Fixed-depth stack of deep copies of the point buffer.
#[derive(Clone, Debug, Default)]
struct UndoHistory {
    entries: VecDeque<Vec<WallPointSlice>>,
}

impl UndoHistory {
    fn push(&mut self, snapshot: Vec<WallPointSlice>) {
        self.entries.push_back(snapshot);
        while self.entries.len() > MAX_UNDO_DEPTH {
            self.entries.pop_front();
        }
    }

    fn pop(&mut self) -> Option<Vec<WallPointSlice>> {
        self.entries.pop_back()
    }
}

/// Interactive view over a `PointCloudStack`: rotation, pan, zoom,
/// rectangle deletion and bounded undo.
///
/// Pointer events only update state and raise the redraw flag; callers
/// re-project once per flag, not once per event.
#[derive(Clone, Debug)]
pub struct Projector {
    initial: ViewerConfig,
    view: ViewState,
    history: UndoHistory,
    drag_last: Option<(f64, f64)>,
    selection: Option<((f64, f64), (f64, f64))>,
    redraw: bool,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl Projector {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            initial: config.clone(),
            view: ViewState::from_config(config),
            history: UndoHistory::default(),
            drag_last: None,
            selection: None,
            redraw: true,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Replace the view that `reset` returns to. The current view is kept.
    pub fn set_initial(&mut self, config: &ViewerConfig) {
        self.initial = config.clone();
    }

    /// Restore the initial view and drop the undo history.
    pub fn reset(&mut self) {
        self.view = ViewState::from_config(&self.initial);
        self.history = UndoHistory::default();
        self.drag_last = None;
        self.selection = None;
        self.redraw = true;
    }

    pub fn mark_dirty(&mut self) {
        self.redraw = true;
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.view.mode = mode;
        self.drag_last = None;
        self.selection = None;
        self.redraw = true;
    }

    pub fn set_noise_filter_level(&mut self, level: u8) {
        self.view.noise_filter_level = level.min(MAX_NOISE_FILTER_LEVEL);
        self.redraw = true;
    }

    /// Apply a drag delta in screen pixels to the rotation.
    pub fn rotate_by(&mut self, dx: f64, dy: f64) {
        self.view.pitch += dy * ROTATION_PER_PIXEL;
        self.view.yaw += dx * ROTATION_PER_PIXEL;
        self.redraw = true;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_x += dx;
        self.view.pan_y += dy;
        self.redraw = true;
    }

    /// One multiplicative zoom step; only the enlarged view zooms.
    pub fn zoom(&mut self, direction: ZoomDirection, kind: ViewKind) -> bool {
        if kind != ViewKind::Enlarged {
            return false;
        }
        self.view.zoom = match direction {
            ZoomDirection::In => (self.view.zoom * ZOOM_STEP).min(MAX_ZOOM),
            ZoomDirection::Out => (self.view.zoom / ZOOM_STEP).max(MIN_ZOOM),
        };
        self.redraw = true;
        true
    }

    /// Current selection rectangle while a delete drag is in progress.
    pub fn selection(&self) -> Option<ScreenRect> {
        self.selection.map(|(a, b)| ScreenRect::from_corners(a, b))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, kind: ViewKind) {
        if kind == ViewKind::Enlarged && self.view.mode == InteractionMode::Delete {
            self.selection = Some(((x, y), (x, y)));
        } else {
            self.drag_last = Some((x, y));
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some((start, _)) = self.selection {
            self.selection = Some((start, (x, y)));
            self.redraw = true;
            return;
        }
        let Some((lx, ly)) = self.drag_last else {
            return;
        };
        let (dx, dy) = (x - lx, y - ly);
        match self.view.mode {
            InteractionMode::Rotate => self.rotate_by(dx, dy),
            InteractionMode::Move => self.pan_by(dx, dy),
            InteractionMode::Delete => {}
        }
        self.drag_last = Some((x, y));
    }

    /// Finish a gesture. A pending selection deletes the enclosed points and
    /// returns how many were removed.
    pub fn pointer_up(&mut self, stack: &mut PointCloudStack, viewport: Viewport) -> usize {
        self.drag_last = None;
        match self.selection.take() {
            Some((a, b)) => self.delete_in_rect(stack, ScreenRect::from_corners(a, b), viewport),
            None => 0,
        }
    }

    /// Remove every point of the enlarged window whose current projection
    /// falls inside `rect`. The pre-deletion buffer is pushed onto the undo
    /// history first.
    pub fn delete_in_rect(
        &mut self,
        stack: &mut PointCloudStack,
        rect: ScreenRect,
        viewport: Viewport,
    ) -> usize {
        self.history.push(stack.snapshot());

        let kind = ViewKind::Enlarged;
        let transform = ProjectionTransform::new(&self.view, kind, viewport);
        let len = stack.len().min(kind.window());
        let mut removed = 0;
        for (idx, slice) in stack.window_mut(kind.window()).enumerate() {
            let z = slice_depth(idx, len, kind.depth_step());
            let before = slice.points.len();
            slice.points.retain(|p| match transform.project(p, z) {
                Some(q) => !rect.contains(q.x, q.y),
                None => true,
            });
            removed += before - slice.points.len();
        }

        debug!(removed, undo_depth = self.history.entries.len(), "Deleted selected wall points");
        self.redraw = true;
        removed
    }

    /// Restore the buffer saved before the most recent deletion.
    pub fn undo(&mut self, stack: &mut PointCloudStack) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                stack.restore(snapshot);
                self.redraw = true;
                true
            }
            None => false,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.history.entries.len()
    }

    /// Project the window of `kind` for rendering, applying the noise filter.
    pub fn project(
        &self,
        stack: &PointCloudStack,
        kind: ViewKind,
        viewport: Viewport,
    ) -> Vec<ProjectedSlice> {
        let window = stack.window(kind.window());
        let len = window.len();
        let transform = ProjectionTransform::new(&self.view, kind, viewport);
        let range = self.view.noise_filter_level as f64 * NOISE_FILTER_RANGE_PER_LEVEL;

        window
            .iter()
            .enumerate()
            .map(|(idx, slice)| {
                let z = slice_depth(idx, len, kind.depth_step());
                let points = slice
                    .points
                    .iter()
                    .filter(|p| {
                        self.view.noise_filter_level == 0
                            || has_adjacent_neighbor(&window, idx, p, range)
                    })
                    .filter_map(|p| transform.project(p, z))
                    .collect();
                ProjectedSlice {
                    frame_index: slice.frame_index,
                    alpha: 0.2 + (idx as f64 / len as f64) * 0.8,
                    points,
                }
            })
            .collect()
    }
}

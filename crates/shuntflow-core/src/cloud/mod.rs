pub mod projector;
pub mod stack;

pub use projector::{
    rotate_point, slice_depth, InteractionMode, ProjectedPoint, ProjectedSlice,
    ProjectionTransform, Projector, ScreenRect, ViewKind, ViewState, Viewport, ZoomDirection,
};
pub use stack::{PointCloudStack, WallPoint, WallPointSlice};

use std::f64::consts::FRAC_PI_2;

use approx::assert_abs_diff_eq;

use shuntflow_core::cloud::{
    rotate_point, InteractionMode, PointCloudStack, ProjectionTransform, Projector, ScreenRect,
    ViewKind, Viewport, WallPoint, WallPointSlice, ZoomDirection,
};
use shuntflow_core::config::ViewerConfig;

fn flat_viewer() -> ViewerConfig {
    ViewerConfig {
        initial_rotation: [0.0, 0.0],
        noise_filter_level: 0,
    }
}

fn slice(frame_index: u64, points: &[(f64, f64)]) -> WallPointSlice {
    WallPointSlice {
        frame_index,
        points: points.iter().map(|&(x, y)| WallPoint { x, y }).collect(),
    }
}

/// Four slices, each with one point left and one right of the origin.
fn paired_stack() -> PointCloudStack {
    let mut stack = PointCloudStack::new();
    for i in 1..=4 {
        stack.push(slice(i * 2, &[(10.0, 0.0), (-10.0, 0.0)]));
    }
    stack
}

const VIEWPORT: Viewport = Viewport {
    width: 200.0,
    height: 200.0,
};

#[test]
fn test_stack_is_bounded_fifo() {
    let mut stack = PointCloudStack::new();
    for i in 1..=200 {
        stack.push(slice(i, &[(0.0, 0.0)]));
        assert!(stack.len() <= 120);
    }
    assert_eq!(stack.len(), 120);
    assert_eq!(stack.iter().next().unwrap().frame_index, 81);

    let window = stack.window(100);
    assert_eq!(window.len(), 100);
    assert_eq!(window[0].frame_index, 101);
    assert_eq!(window[99].frame_index, 200);
}

#[test]
fn test_rotation_composition() {
    let (x, y, z) = rotate_point(0.0, 1.0, 0.0, FRAC_PI_2, 0.0);
    assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(z, 1.0, epsilon = 1e-12);

    let (x, y, z) = rotate_point(1.0, 0.0, 0.0, 0.0, FRAC_PI_2);
    assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(z, -1.0, epsilon = 1e-12);
}

#[test]
fn test_points_behind_camera_are_excluded() {
    let projector = Projector::new(&flat_viewer());
    let t = ProjectionTransform::new(projector.view(), ViewKind::Enlarged, VIEWPORT);
    let p = WallPoint { x: 1.0, y: 1.0 };
    assert!(t.project(&p, 400.0).is_none());
    assert!(t.project(&p, 550.0).is_none());

    let q = t.project(&p, 200.0).unwrap();
    assert_abs_diff_eq!(q.perspective, 2.0);
    assert_abs_diff_eq!(q.x, 102.0);
}

#[test]
fn test_inline_view_ignores_pan_and_zoom() {
    let mut projector = Projector::new(&flat_viewer());
    projector.pan_by(50.0, 20.0);
    projector.zoom(ZoomDirection::In, ViewKind::Enlarged);

    let mut stack = PointCloudStack::new();
    stack.push(slice(2, &[(10.0, 0.0)]));

    let inline = projector.project(&stack, ViewKind::Inline, VIEWPORT);
    // One slice: z = (0 - 1/2) * 2 = -1.
    let expected = 100.0 + 10.0 * 0.5 * 400.0 / 401.0;
    assert_abs_diff_eq!(inline[0].points[0].x, expected, epsilon = 1e-9);
    assert_abs_diff_eq!(inline[0].points[0].y, 100.0, epsilon = 1e-9);

    let enlarged = projector.project(&stack, ViewKind::Enlarged, VIEWPORT);
    let expected = 150.0 + 10.0 * 1.1 * 400.0 / (400.0 + 1.5);
    assert_abs_diff_eq!(enlarged[0].points[0].x, expected, epsilon = 1e-9);
    assert_abs_diff_eq!(enlarged[0].points[0].y, 120.0, epsilon = 1e-9);
}

#[test]
fn test_delete_removes_exactly_points_inside_projection() {
    let mut projector = Projector::new(&flat_viewer());
    let mut stack = paired_stack();
    let rect = ScreenRect::from_corners((120.0, 105.0), (105.0, 95.0));

    let removed = projector.delete_in_rect(&mut stack, rect, VIEWPORT);
    assert_eq!(removed, 4);
    for s in stack.iter() {
        assert_eq!(s.points, vec![WallPoint { x: -10.0, y: 0.0 }]);
    }
}

#[test]
fn test_delete_uses_live_pan() {
    let mut projector = Projector::new(&flat_viewer());
    let mut stack = paired_stack();
    projector.pan_by(50.0, 0.0);

    let stale = ScreenRect::from_corners((105.0, 95.0), (120.0, 105.0));
    assert_eq!(projector.delete_in_rect(&mut stack, stale, VIEWPORT), 0);
    assert_eq!(stack.total_points(), 8);

    let live = ScreenRect::from_corners((155.0, 95.0), (170.0, 105.0));
    assert_eq!(projector.delete_in_rect(&mut stack, live, VIEWPORT), 4);
    assert_eq!(stack.total_points(), 4);
}

#[test]
fn test_undo_restores_pre_deletion_buffer() {
    let mut projector = Projector::new(&flat_viewer());
    let mut stack = paired_stack();
    let before = stack.snapshot();

    let rect = ScreenRect::from_corners((0.0, 0.0), (200.0, 200.0));
    assert_eq!(projector.delete_in_rect(&mut stack, rect, VIEWPORT), 8);
    assert_eq!(stack.total_points(), 0);

    assert!(projector.undo(&mut stack));
    assert_eq!(stack.snapshot(), before);
    assert!(!projector.undo(&mut stack));
}

#[test]
fn test_undo_history_is_capped() {
    let mut projector = Projector::new(&flat_viewer());
    let mut stack = paired_stack();
    let empty_rect = ScreenRect::from_corners((0.0, 0.0), (1.0, 1.0));
    for _ in 0..7 {
        projector.delete_in_rect(&mut stack, empty_rect, VIEWPORT);
    }
    assert_eq!(projector.undo_depth(), 5);
    for _ in 0..5 {
        assert!(projector.undo(&mut stack));
    }
    assert!(!projector.undo(&mut stack));
}

#[test]
fn test_pointer_selection_deletes_on_release() {
    let mut projector = Projector::new(&flat_viewer());
    let mut stack = paired_stack();
    projector.set_mode(InteractionMode::Delete);

    projector.pointer_down(105.0, 95.0, ViewKind::Enlarged);
    projector.pointer_move(120.0, 105.0);
    let sel = projector.selection().unwrap();
    assert_eq!(sel.max_x, 120.0);
    assert_eq!(projector.pointer_up(&mut stack, VIEWPORT), 4);
    assert!(projector.selection().is_none());

    // Inline view never selects.
    projector.pointer_down(0.0, 0.0, ViewKind::Inline);
    projector.pointer_move(200.0, 200.0);
    assert_eq!(projector.pointer_up(&mut stack, VIEWPORT), 0);
    assert_eq!(stack.total_points(), 4);
}

#[test]
fn test_drag_rotates_and_pans() {
    let mut projector = Projector::new(&flat_viewer());
    projector.pointer_down(0.0, 0.0, ViewKind::Inline);
    projector.pointer_move(10.0, 20.0);
    assert_abs_diff_eq!(projector.view().yaw, 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(projector.view().pitch, 0.2, epsilon = 1e-12);

    projector.set_mode(InteractionMode::Move);
    projector.pointer_down(0.0, 0.0, ViewKind::Enlarged);
    projector.pointer_move(5.0, -5.0);
    projector.pointer_move(7.0, -5.0);
    assert_eq!(projector.view().pan_x, 7.0);
    assert_eq!(projector.view().pan_y, -5.0);
    assert_abs_diff_eq!(projector.view().yaw, 0.1, epsilon = 1e-12);
}

#[test]
fn test_zoom_is_clamped_and_enlarged_only() {
    let mut projector = Projector::default();
    for _ in 0..30 {
        projector.zoom(ZoomDirection::In, ViewKind::Enlarged);
    }
    assert_eq!(projector.view().zoom, 5.0);
    for _ in 0..60 {
        projector.zoom(ZoomDirection::Out, ViewKind::Enlarged);
    }
    assert_eq!(projector.view().zoom, 0.2);
    assert!(!projector.zoom(ZoomDirection::In, ViewKind::Inline));
    assert_eq!(projector.view().zoom, 0.2);
}

#[test]
fn test_noise_filter_needs_adjacent_slice_neighbour() {
    let mut stack = PointCloudStack::new();
    stack.push(slice(2, &[(0.0, 0.0)]));
    stack.push(slice(4, &[(1.0, 1.0), (50.0, 50.0)]));
    stack.push(slice(6, &[(2.0, 2.0)]));

    let mut projector = Projector::new(&flat_viewer());
    let count = |p: &Projector| -> usize {
        p.project(&stack, ViewKind::Enlarged, VIEWPORT)
            .iter()
            .map(|s| s.points.len())
            .sum()
    };
    assert_eq!(count(&projector), 4);

    projector.set_noise_filter_level(1);
    assert_eq!(count(&projector), 3);

    let slices = projector.project(&stack, ViewKind::Enlarged, VIEWPORT);
    assert_abs_diff_eq!(slices[0].alpha, 0.2);
    assert_abs_diff_eq!(slices[2].alpha, 0.2 + 2.0 / 3.0 * 0.8, epsilon = 1e-12);
}

#[test]
fn test_redraw_flag_and_reset() {
    let mut projector = Projector::default();
    assert!(projector.take_redraw());
    assert!(!projector.take_redraw());

    projector.rotate_by(100.0, 0.0);
    assert!(projector.take_redraw());
    assert_abs_diff_eq!(projector.view().yaw, 1.5, epsilon = 1e-12);

    projector.set_mode(InteractionMode::Delete);
    projector.reset();
    assert_eq!(projector.view().yaw, 0.5);
    assert_eq!(projector.view().pitch, 0.5);
    assert_eq!(projector.view().mode, InteractionMode::Rotate);
    assert_eq!(projector.undo_depth(), 0);
}

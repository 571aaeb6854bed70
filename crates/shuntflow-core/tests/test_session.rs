mod common;

use approx::assert_relative_eq;
use common::{solid_frame, square_frame, GRAY};

use shuntflow_core::cloud::{Viewport, ZoomDirection};
use shuntflow_core::config::{AnalysisConfig, AreaUnit, SessionConfig};
use shuntflow_core::diagnostics::FindingKind;
use shuntflow_core::error::ShuntError;
use shuntflow_core::extract::stress_from_velocity;
use shuntflow_core::io::MemoryFrameSource;
use shuntflow_core::series::StenosisCategory;
use shuntflow_core::session::{
    AnalysisSession, AnalysisTask, SessionStatus, ViewCommand, ViewEffect, WssLevel,
};

const VIEWPORT: Viewport = Viewport {
    width: 20.0,
    height: 20.0,
};

fn session() -> AnalysisSession {
    AnalysisSession::new(SessionConfig::default()).unwrap()
}

fn red_square() -> shuntflow_core::frame::RgbaFrame {
    square_frame(20, 20, 8, 8, 4, [100, 0, 0])
}

#[test]
fn test_neutral_stream_end_to_end() {
    let frames = (0..10).map(|_| solid_frame(20, 20, GRAY)).collect();
    let mut task = AnalysisTask::new(MemoryFrameSource::new(frames, 30.0), session());

    let report = task.run_to_end().unwrap().expect("stream ended");

    assert_eq!(report.frames_processed, 10);
    assert_relative_eq!(report.duration_sec.unwrap(), 10.0 / 30.0);
    assert_eq!(report.area_unit, AreaUnit::SquarePixels);
    assert_eq!(report.sectors.len(), 36);
    assert!(report.sectors.iter().all(|r| r.tawss == 0.0 && r.max_frame == 0));

    assert_eq!(report.samples.len(), 1);
    let sample = &report.samples[0];
    assert_eq!(sample.frame_index, 6);
    assert_relative_eq!(sample.time_sec.unwrap(), 5.0 / 30.0);
    assert_eq!(sample.avg_wss, 0.0);
    assert_eq!(sample.area, 0.0);
    assert_eq!(sample.pressure_proxy, 0.0);

    assert!(report.stenosis.features.is_none());
    assert_eq!(report.stenosis.classification.category, StenosisCategory::None);
    assert_eq!(report.diagnostics.findings[0].kind, FindingKind::Normal);

    let s = task.session();
    assert_eq!(*s.status(), SessionStatus::Complete);
    assert_eq!(s.sectors().total_count(), 0);
    assert_eq!(s.stack().len(), 5);
    assert_eq!(s.stack().total_points(), 0);
    assert!(s.previous_centroid().is_none());
    assert_eq!(s.report(), Some(&report));

    let metrics = s.latest_metrics().unwrap();
    assert_eq!(metrics.avg, 0.0);
    assert_eq!(metrics.evaluation, WssLevel::Norm);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"frames_processed\":10"));
}

#[test]
fn test_slice_and_sample_cadence() {
    let mut s = session();
    let expected = stress_from_velocity(100, 2.5);

    for count in 1..=12u64 {
        let out = s.process_frame(&red_square()).unwrap();
        assert_eq!(out.frame_count, count);
        assert_eq!(out.slice_pushed, count % 2 == 0);
        assert_eq!(out.sample.is_some(), count % 6 == 0);
        assert_eq!(out.metrics.is_some(), count % 6 == 0);
        assert_eq!(out.overlay.dimensions(), (20, 20));
    }

    assert_eq!(s.frames_processed(), 12);
    assert_eq!(s.stack().len(), 6);
    assert_eq!(s.sampler().len(), 2);
    assert_eq!(s.sectors().total_count(), 12 * 16);

    let samples = s.sampler().samples();
    assert_eq!(samples[1].frame_index, 12);
    assert_relative_eq!(samples[1].avg_wss, expected, epsilon = 1e-9);
    assert_relative_eq!(samples[1].area, 16.0);
    assert_relative_eq!(samples[1].pressure_proxy, 100.0);

    let metrics = s.latest_metrics().unwrap();
    assert_relative_eq!(metrics.max, expected);
    assert_eq!(metrics.unit, AreaUnit::SquarePixels);
    assert_eq!(metrics.evaluation, WssLevel::from_avg(metrics.avg));
}

#[test]
fn test_centroid_survives_flowless_frames() {
    let mut s = session();
    s.process_frame(&red_square()).unwrap();
    let c = s.previous_centroid().unwrap();
    assert_relative_eq!(c.x, 9.5);
    assert_relative_eq!(c.y, 9.5);

    s.process_frame(&solid_frame(20, 20, GRAY)).unwrap();
    assert_eq!(s.previous_centroid(), Some(c));
}

#[test]
fn test_calibrated_area() {
    let config = SessionConfig {
        analysis: AnalysisConfig {
            scale_px_per_cm: 10.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = AnalysisSession::new(config).unwrap();
    let mut last = None;
    for _ in 0..6 {
        last = s.process_frame(&red_square()).unwrap().metrics;
    }
    let metrics = last.unwrap();
    assert_eq!(metrics.unit, AreaUnit::SquareCentimeters);
    assert_relative_eq!(metrics.area, 0.16);
}

#[test]
fn test_closed_session_needs_reset() {
    let mut s = session();
    for _ in 0..3 {
        s.process_frame(&red_square()).unwrap();
    }
    s.finalize();
    assert_eq!(*s.status(), SessionStatus::Complete);
    assert!(matches!(
        s.process_frame(&red_square()),
        Err(ShuntError::SessionClosed(_))
    ));

    s.reset();
    assert_eq!(*s.status(), SessionStatus::Idle);
    assert_eq!(s.frames_processed(), 0);
    assert_eq!(s.sectors().total_count(), 0);
    assert!(s.stack().is_empty());
    assert!(s.sampler().is_empty());
    assert!(s.previous_centroid().is_none());
    assert!(s.report().is_none());

    s.process_frame(&red_square()).unwrap();
    assert_eq!(*s.status(), SessionStatus::Analyzing);
}

#[test]
fn test_stopped_session_keeps_state() {
    let mut s = session();
    s.process_frame(&red_square()).unwrap();
    s.stop();
    assert_eq!(*s.status(), SessionStatus::Stopped);
    assert_eq!(s.sectors().total_count(), 16);
    assert!(s.process_frame(&red_square()).is_err());
}

#[test]
fn test_sector_count_change_rebuilds_bins() {
    let mut s = session();
    s.process_frame(&red_square()).unwrap();

    let same_count = AnalysisConfig {
        color_threshold: 30.0,
        ..Default::default()
    };
    s.update_analysis(same_count).unwrap();
    assert_eq!(s.sectors().total_count(), 16);
    assert_eq!(s.config().analysis.color_threshold, 30.0);

    let fewer = AnalysisConfig {
        sector_count: 12,
        ..Default::default()
    };
    s.update_analysis(fewer).unwrap();
    assert_eq!(s.sectors().sector_count(), 12);
    assert_eq!(s.sectors().total_count(), 0);

    let invalid = AnalysisConfig {
        sector_count: 0,
        ..Default::default()
    };
    assert!(s.update_analysis(invalid).is_err());
    assert_eq!(s.config().analysis.sector_count, 12);
}

#[test]
fn test_realtime_levels() {
    assert_eq!(WssLevel::from_avg(0.0), WssLevel::Norm);
    assert_eq!(WssLevel::from_avg(40.0), WssLevel::Norm);
    assert_eq!(WssLevel::from_avg(40.5), WssLevel::Warn);
    assert_eq!(WssLevel::from_avg(80.0), WssLevel::Warn);
    assert_eq!(WssLevel::from_avg(80.1), WssLevel::High);
    assert_eq!(WssLevel::High.to_string(), "HIGH");
}

#[test]
fn test_view_commands() {
    let mut s = session();
    assert_eq!(
        s.apply_view_command(ViewCommand::Zoom(ZoomDirection::In), VIEWPORT),
        ViewEffect::Updated
    );
    assert_relative_eq!(s.projector().view().zoom, 1.1);
    assert_eq!(
        s.apply_view_command(ViewCommand::Undo, VIEWPORT),
        ViewEffect::Undone(false)
    );
    assert_eq!(
        s.apply_view_command(ViewCommand::PointerUp, VIEWPORT),
        ViewEffect::Updated
    );
    s.apply_view_command(ViewCommand::ResetView, VIEWPORT);
    assert_relative_eq!(s.projector().view().zoom, 1.0);
}

#[test]
fn test_view_reset_follows_updated_viewer_config() {
    let mut s = session();
    let mut config = s.config().clone();
    config.viewer.initial_rotation = [0.1, -0.2];
    config.viewer.noise_filter_level = 2;
    s.update_config(config).unwrap();

    s.apply_view_command(ViewCommand::Rotate { dx: 40.0, dy: 40.0 }, VIEWPORT);
    s.apply_view_command(ViewCommand::ResetView, VIEWPORT);

    let view = s.projector().view();
    assert_relative_eq!(view.pitch, 0.1);
    assert_relative_eq!(view.yaw, -0.2);
    assert_eq!(view.noise_filter_level, 2);
}

mod common;

use std::path::PathBuf;

use approx::assert_relative_eq;
use image::RgbaImage;
use common::{solid_frame, square_frame, GRAY};

use shuntflow_core::cloud::ZoomDirection;
use shuntflow_core::config::{AnalysisConfig, SessionConfig};
use shuntflow_core::error::{Result, ShuntError};
use shuntflow_core::frame::{RgbaFrame, SourceInfo, SourceKind};
use shuntflow_core::io::{FrameSource, MemoryFrameSource, SourcePoll};
use shuntflow_core::session::{
    AnalysisSession, AnalysisTask, SessionStatus, TaskCommand, TickOutcome, ViewCommand,
};

fn gray_source(n: usize) -> MemoryFrameSource {
    MemoryFrameSource::new((0..n).map(|_| solid_frame(16, 16, GRAY)).collect(), 30.0)
}

fn task(source: MemoryFrameSource) -> AnalysisTask<MemoryFrameSource> {
    AnalysisTask::new(source, AnalysisSession::new(SessionConfig::default()).unwrap())
}

/// Yields one frame, then fails every poll.
struct FailingSource {
    served: bool,
}

impl FrameSource for FailingSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: PathBuf::from("failing"),
            kind: SourceKind::Memory,
            total_frames: None,
            width: 16,
            height: 16,
            duration_sec: None,
        }
    }

    fn poll_frame(&mut self) -> Result<SourcePoll> {
        if self.served {
            return Err(ShuntError::InvalidSer("decoder lost sync".into()));
        }
        self.served = true;
        Ok(SourcePoll::Frame(square_frame(16, 16, 6, 6, 4, [120, 0, 0])))
    }

    fn duration_sec(&self) -> Option<f64> {
        None
    }
}

#[test]
fn test_start_returns_pending_token() {
    let mut t = task(gray_source(3));
    let first = t.start().unwrap();
    assert_eq!(t.start(), Some(first));
    assert!(t.is_scheduled());
}

#[test]
fn test_token_is_stale_after_stop() {
    let mut t = task(gray_source(3));
    let token = t.start().unwrap();
    t.stop();

    assert!(matches!(t.tick(token), TickOutcome::Stale));
    assert_eq!(*t.session().status(), SessionStatus::Stopped);
    assert_eq!(t.session().frames_processed(), 0);
    assert!(t.start().is_none());
}

#[test]
fn test_token_is_stale_after_reset() {
    let mut t = task(gray_source(4));
    let token = t.start().unwrap();
    let next = match t.tick(token) {
        TickOutcome::Continue(next, output) => {
            assert_eq!(output.frame_count, 1);
            next
        }
        other => panic!("expected a processed frame, got {other:?}"),
    };

    t.reset();
    assert!(matches!(t.tick(next), TickOutcome::Stale));
    assert_eq!(t.session().frames_processed(), 0);

    let fresh = t.start().unwrap();
    assert!(fresh.generation() > next.generation());
    assert!(matches!(t.tick(fresh), TickOutcome::Continue(..)));
    assert_eq!(t.session().frames_processed(), 1);
}

#[test]
fn test_used_token_cannot_tick_twice() {
    let mut t = task(gray_source(3));
    let token = t.start().unwrap();
    assert!(matches!(t.tick(token), TickOutcome::Continue(..)));
    assert!(matches!(t.tick(token), TickOutcome::Stale));
}

#[test]
fn test_pause_then_resume_to_completion() {
    let mut source = gray_source(4);
    source.insert_event(2, SourcePoll::Paused);
    let mut t = task(source);

    assert!(t.run_to_end().unwrap().is_none());
    assert_eq!(*t.session().status(), SessionStatus::Paused);
    assert_eq!(t.session().frames_processed(), 2);
    assert!(!t.is_scheduled());

    let report = t.run_to_end().unwrap().expect("resumed stream ended");
    assert_eq!(report.frames_processed, 4);
    assert_relative_eq!(report.duration_sec.unwrap(), 4.0 / 30.0);
    assert_eq!(*t.session().status(), SessionStatus::Complete);
    assert!(t.start().is_none());
}

#[test]
fn test_detached_source_stops() {
    let mut source = gray_source(4);
    source.insert_event(1, SourcePoll::Detached);
    let mut t = task(source);

    assert!(t.run_to_end().unwrap().is_none());
    assert_eq!(*t.session().status(), SessionStatus::Stopped);
    assert_eq!(t.session().frames_processed(), 1);
    assert!(t.session().report().is_none());
    assert!(t.start().is_none());
    assert_eq!(t.source().remaining(), 3);
}

#[test]
fn test_failure_halts_without_reschedule() {
    let session = AnalysisSession::new(SessionConfig::default()).unwrap();
    let mut t = AnalysisTask::new(FailingSource { served: false }, session);

    let token = t.start().unwrap();
    let token = match t.tick(token) {
        TickOutcome::Continue(next, _) => next,
        other => panic!("expected a processed frame, got {other:?}"),
    };
    match t.tick(token) {
        TickOutcome::Failed(message) => assert!(message.contains("decoder lost sync")),
        other => panic!("expected failure, got {other:?}"),
    }

    assert!(matches!(t.session().status(), SessionStatus::Error(_)));
    assert!(!t.is_scheduled());
    assert!(t.start().is_none());
    assert!(matches!(t.tick(token), TickOutcome::Stale));
    // Accumulated state of the processed frame is kept.
    assert_eq!(t.session().sectors().total_count(), 16);
}

#[test]
fn test_run_to_end_reports_failure() {
    let session = AnalysisSession::new(SessionConfig::default()).unwrap();
    let mut t = AnalysisTask::new(FailingSource { served: false }, session);
    assert!(matches!(t.run_to_end(), Err(ShuntError::FrameTask(_))));
}

#[test]
fn test_commands_apply_between_ticks() {
    let mut t = task(gray_source(3));
    let token = t.start().unwrap();

    t.enqueue(TaskCommand::View(ViewCommand::Zoom(ZoomDirection::In)));
    let config = SessionConfig {
        analysis: AnalysisConfig {
            sector_count: 8,
            ..Default::default()
        },
        ..Default::default()
    };
    t.enqueue(TaskCommand::UpdateConfig(config));
    t.enqueue(TaskCommand::UpdateConfig(SessionConfig {
        analysis: AnalysisConfig {
            sector_count: 0,
            ..Default::default()
        },
        ..Default::default()
    }));

    let token = match t.tick(token) {
        TickOutcome::Continue(next, _) => next,
        other => panic!("expected a processed frame, got {other:?}"),
    };
    assert_relative_eq!(t.session().projector().view().zoom, 1.1);
    assert_eq!(t.session().sectors().sector_count(), 8);

    t.enqueue(TaskCommand::Stop);
    t.enqueue(TaskCommand::View(ViewCommand::Zoom(ZoomDirection::In)));
    assert!(matches!(t.tick(token), TickOutcome::Stopped));
    assert_eq!(*t.session().status(), SessionStatus::Stopped);
    assert_eq!(t.session().frames_processed(), 1);
    assert_relative_eq!(t.session().projector().view().zoom, 1.1);
}

#[test]
fn test_apply_commands_outside_tick() {
    let mut t = task(gray_source(1));
    t.enqueue(TaskCommand::View(ViewCommand::Undo));
    t.enqueue(TaskCommand::View(ViewCommand::Zoom(ZoomDirection::Out)));
    let effects = t.apply_commands();
    assert_eq!(effects.len(), 2);
    assert!(t.apply_commands().is_empty());
}

#[test]
fn test_pause_before_first_frame() {
    let mut source = gray_source(2);
    source.insert_event(0, SourcePoll::Paused);
    let mut t = task(source);

    assert!(t.run_to_end().unwrap().is_none());
    assert_eq!(*t.session().status(), SessionStatus::Paused);
    assert_eq!(t.session().frames_processed(), 0);

    let report = t.run_to_end().unwrap().expect("resumed stream ended");
    assert_eq!(report.frames_processed, 2);
}

#[test]
fn test_zero_width_frame_does_not_halt_task() {
    let frames = vec![
        RgbaFrame::new(RgbaImage::new(0, 10)),
        solid_frame(16, 16, GRAY),
    ];
    let mut t = task(MemoryFrameSource::new(frames, 30.0));

    let report = t.run_to_end().unwrap().expect("stream ended");
    assert_eq!(report.frames_processed, 2);
    assert_eq!(*t.session().status(), SessionStatus::Complete);
}

//! Session context and the frame task that drives it.

pub mod context;
pub mod task;
pub mod types;

pub use context::{AnalysisSession, ViewCommand, ViewEffect};
pub use task::{AnalysisTask, TaskCommand, TickOutcome, TickToken};
pub use types::{
    AnalysisStage, FrameOutput, NoOpReporter, ProgressReporter, RealtimeMetrics, SessionReport,
    SessionStatus, WssLevel,
};

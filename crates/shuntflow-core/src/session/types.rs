use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::config::AreaUnit;
use crate::consts::{REALTIME_HIGH_WSS, REALTIME_WARN_WSS};
use crate::diagnostics::DiagnosticReport;
use crate::extract::FrameStats;
use crate::sectors::SectorResult;
use crate::series::{StenosisReport, TimeSeriesSample};

/// Lifecycle of an analysis session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    Analyzing,
    /// Source paused; polling may resume.
    Paused,
    /// Finalized at end of stream.
    Complete,
    /// Stopped by the user or a detached source; accumulators are frozen.
    Stopped,
    Error(String),
}

impl SessionStatus {
    /// Whether the session must be reset before it accepts frames again.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Complete | Self::Stopped | Self::Error(_))
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Paused => write!(f, "paused"),
            Self::Complete => write!(f, "complete"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Traffic-light reading of the current average stress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WssLevel {
    Norm,
    Warn,
    High,
}

impl WssLevel {
    pub fn from_avg(avg: f64) -> Self {
        if avg > REALTIME_HIGH_WSS {
            Self::High
        } else if avg > REALTIME_WARN_WSS {
            Self::Warn
        } else {
            Self::Norm
        }
    }
}

impl std::fmt::Display for WssLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Norm => write!(f, "NORM"),
            Self::Warn => write!(f, "WARN"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Live readout refreshed on every sampling frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMetrics {
    pub avg: f64,
    pub max: f64,
    pub area: f64,
    pub unit: AreaUnit,
    pub evaluation: WssLevel,
}

/// What one processed frame produced.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    /// One-based processed-frame count after this frame.
    pub frame_count: u64,
    pub overlay: RgbaImage,
    pub stats: FrameStats,
    pub slice_pushed: bool,
    pub sample: Option<TimeSeriesSample>,
    pub metrics: Option<RealtimeMetrics>,
}

/// Everything produced at session end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub frames_processed: u64,
    pub duration_sec: Option<f64>,
    pub area_unit: AreaUnit,
    pub sectors: Vec<SectorResult>,
    pub samples: Vec<TimeSeriesSample>,
    pub stenosis: StenosisReport,
    pub diagnostics: DiagnosticReport,
}

/// Analysis stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisStage {
    Analyzing,
    Summarizing,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyzing => write!(f, "Analyzing frames"),
            Self::Summarizing => write!(f, "Summarizing"),
        }
    }
}

/// Thread-safe progress reporting for the frame task.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started. `total_items` is the frame count, if known.
    fn begin_stage(&self, _stage: AnalysisStage, _total_items: Option<usize>) {}

    /// `items_done` frames have been processed so far.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

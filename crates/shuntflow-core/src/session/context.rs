use tracing::{debug, error, info};

use crate::cloud::{
    InteractionMode, PointCloudStack, ProjectedSlice, Projector, ViewKind, Viewport,
    WallPointSlice, ZoomDirection,
};
use crate::config::{AnalysisConfig, SessionConfig};
use crate::consts::{SAMPLE_CADENCE, SLICE_CADENCE};
use crate::diagnostics::diagnose;
use crate::error::{Result, ShuntError};
use crate::extract::{extract_frame, Centroid};
use crate::frame::RgbaFrame;
use crate::sectors::{summarize, SectorAccumulator};
use crate::series::{assess_stenosis, TimeSeriesSample, TimeSeriesSampler};

use super::types::{FrameOutput, RealtimeMetrics, SessionReport, SessionStatus, WssLevel};

/// Interactive edit of the 3D view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewCommand {
    Rotate { dx: f64, dy: f64 },
    Pan { dx: f64, dy: f64 },
    Zoom(ZoomDirection),
    SetMode(InteractionMode),
    SetNoiseFilter(u8),
    PointerDown { x: f64, y: f64, kind: ViewKind },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    Undo,
    ResetView,
}

/// Observable result of a `ViewCommand`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEffect {
    Updated,
    Deleted(usize),
    Undone(bool),
    Ignored,
}

/// Explicit per-session state. Every processing call goes through here;
/// nothing is shared outside of it.
pub struct AnalysisSession {
    config: SessionConfig,
    sectors: SectorAccumulator,
    previous_centroid: Option<Centroid>,
    frames_processed: u64,
    stack: PointCloudStack,
    projector: Projector,
    sampler: TimeSeriesSampler,
    status: SessionStatus,
    latest_metrics: Option<RealtimeMetrics>,
    duration_sec: Option<f64>,
    report: Option<SessionReport>,
}

impl AnalysisSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        info!(
            sectors = config.analysis.sector_count,
            color_threshold = config.analysis.color_threshold,
            "Starting analysis session"
        );
        Ok(Self {
            sectors: SectorAccumulator::new(config.analysis.sector_count),
            projector: Projector::new(&config.viewer),
            config,
            previous_centroid: None,
            frames_processed: 0,
            stack: PointCloudStack::new(),
            sampler: TimeSeriesSampler::new(),
            status: SessionStatus::Idle,
            latest_metrics: None,
            duration_sec: None,
            report: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn sectors(&self) -> &SectorAccumulator {
        &self.sectors
    }

    pub fn stack(&self) -> &PointCloudStack {
        &self.stack
    }

    pub fn sampler(&self) -> &TimeSeriesSampler {
        &self.sampler
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn latest_metrics(&self) -> Option<&RealtimeMetrics> {
        self.latest_metrics.as_ref()
    }

    pub fn previous_centroid(&self) -> Option<Centroid> {
        self.previous_centroid
    }

    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn set_duration(&mut self, duration_sec: Option<f64>) {
        self.duration_sec = duration_sec.filter(|d| d.is_finite() && *d > 0.0);
    }

    /// Replace the configuration between frames. A new sector count
    /// re-creates the sector accumulator.
    pub fn update_config(&mut self, config: SessionConfig) -> Result<()> {
        config.validate()?;
        if config.analysis.sector_count != self.sectors.sector_count() {
            info!(
                from = self.sectors.sector_count(),
                to = config.analysis.sector_count,
                "Sector count changed, re-initialising accumulator"
            );
            self.sectors = SectorAccumulator::new(config.analysis.sector_count);
        }
        if config.viewer.noise_filter_level != self.config.viewer.noise_filter_level {
            self.projector
                .set_noise_filter_level(config.viewer.noise_filter_level);
        }
        if config.viewer != self.config.viewer {
            self.projector.set_initial(&config.viewer);
        }
        self.config = config;
        Ok(())
    }

    pub fn update_analysis(&mut self, analysis: AnalysisConfig) -> Result<()> {
        let config = SessionConfig {
            analysis,
            ..self.config.clone()
        };
        self.update_config(config)
    }

    /// Run one frame through the extractor and feed the bounded buffers.
    pub fn process_frame(&mut self, frame: &RgbaFrame) -> Result<FrameOutput> {
        if self.status.is_closed() {
            return Err(ShuntError::SessionClosed(self.status.to_string()));
        }
        self.status = SessionStatus::Analyzing;

        let frame_index = self.frames_processed;
        let count = frame_index + 1;
        let detect_walls = count % SLICE_CADENCE == 0;

        let extraction = extract_frame(
            frame,
            &self.config.analysis,
            self.previous_centroid,
            frame_index,
            &mut self.sectors,
            detect_walls,
        );
        if extraction.centroid.is_some() {
            self.previous_centroid = extraction.centroid;
        }
        self.frames_processed = count;

        let slice_pushed = match extraction.wall_points {
            Some(points) => {
                self.stack.push(WallPointSlice {
                    frame_index: count,
                    points,
                });
                self.projector.mark_dirty();
                true
            }
            None => false,
        };

        let stats = extraction.stats;
        let (sample, metrics) = if count % SAMPLE_CADENCE == 0 {
            let area = self.config.analysis.area_from_pixels(stats.flow_pixels);
            let sample = TimeSeriesSample {
                frame_index: count,
                time_sec: frame.metadata.timestamp_sec,
                avg_wss: stats.avg_stress(),
                area,
                pressure_proxy: stats.mean_red(),
            };
            self.sampler.record(sample.clone());

            let metrics = RealtimeMetrics {
                avg: sample.avg_wss,
                max: stats.max_stress,
                area,
                unit: self.config.analysis.area_unit(),
                evaluation: WssLevel::from_avg(sample.avg_wss),
            };
            self.latest_metrics = Some(metrics.clone());
            (Some(sample), Some(metrics))
        } else {
            (None, None)
        };

        Ok(FrameOutput {
            frame_count: count,
            overlay: extraction.overlay,
            stats,
            slice_pushed,
            sample,
            metrics,
        })
    }

    /// Summarize sectors, classify the series and mark the session complete.
    pub fn finalize(&mut self) -> SessionReport {
        let sectors = summarize(&self.sectors);
        let stenosis = assess_stenosis(
            &self.sampler,
            self.duration_sec,
            self.frames_processed,
            &self.config.stenosis,
        );
        let diagnostics = diagnose(&sectors, &self.sampler.areas());

        let report = SessionReport {
            frames_processed: self.frames_processed,
            duration_sec: self.duration_sec,
            area_unit: self.config.analysis.area_unit(),
            sectors,
            samples: self.sampler.samples(),
            stenosis,
            diagnostics,
        };

        info!(
            frames = self.frames_processed,
            samples = self.sampler.len(),
            slices = self.stack.len(),
            binned_pixels = self.sectors.total_count(),
            category = %report.stenosis.classification.label(),
            "Analysis complete"
        );
        self.status = SessionStatus::Complete;
        self.report = Some(report.clone());
        report
    }

    /// Freeze accumulators in place. Further frames need a reset.
    pub fn stop(&mut self) {
        if !self.status.is_closed() {
            debug!(frames = self.frames_processed, "Analysis stopped");
            self.status = SessionStatus::Stopped;
        }
    }

    /// Hold an open session, including one whose source paused before its
    /// first frame.
    pub fn pause(&mut self) {
        if !self.status.is_closed() {
            self.status = SessionStatus::Paused;
        }
    }

    /// Halt after an unexpected failure.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(frames = self.frames_processed, %message, "Analysis halted");
        self.status = SessionStatus::Error(message);
    }

    /// Discard every accumulated buffer and return to `Idle`.
    pub fn reset(&mut self) {
        self.sectors = SectorAccumulator::new(self.config.analysis.sector_count);
        self.previous_centroid = None;
        self.frames_processed = 0;
        self.stack.clear();
        self.projector.reset();
        self.sampler.clear();
        self.status = SessionStatus::Idle;
        self.latest_metrics = None;
        self.report = None;
        info!("Analysis session reset");
    }

    pub fn apply_view_command(&mut self, command: ViewCommand, viewport: Viewport) -> ViewEffect {
        let p = &mut self.projector;
        match command {
            ViewCommand::Rotate { dx, dy } => p.rotate_by(dx, dy),
            ViewCommand::Pan { dx, dy } => p.pan_by(dx, dy),
            ViewCommand::Zoom(direction) => {
                if !p.zoom(direction, ViewKind::Enlarged) {
                    return ViewEffect::Ignored;
                }
            }
            ViewCommand::SetMode(mode) => p.set_mode(mode),
            ViewCommand::SetNoiseFilter(level) => p.set_noise_filter_level(level),
            ViewCommand::PointerDown { x, y, kind } => p.pointer_down(x, y, kind),
            ViewCommand::PointerMove { x, y } => p.pointer_move(x, y),
            ViewCommand::PointerUp => {
                let had_selection = p.selection().is_some();
                let removed = p.pointer_up(&mut self.stack, viewport);
                if had_selection {
                    return ViewEffect::Deleted(removed);
                }
            }
            ViewCommand::Undo => return ViewEffect::Undone(p.undo(&mut self.stack)),
            ViewCommand::ResetView => p.reset(),
        }
        ViewEffect::Updated
    }

    /// Project the current stack for `kind`.
    pub fn project(&self, kind: ViewKind, viewport: Viewport) -> Vec<ProjectedSlice> {
        self.projector.project(&self.stack, kind, viewport)
    }

    /// Re-projection is due (after an edit or a new slice). Clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        self.projector.take_redraw()
    }
}

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use shuntflow_core::config::{NormRect, SessionConfig};
use shuntflow_core::consts::DEFAULT_FPS;
use shuntflow_core::export::{write_sector_csv, write_time_series_csv};
use shuntflow_core::io::{open_source, FrameSource};
use shuntflow_core::session::{
    AnalysisSession, AnalysisStage, AnalysisTask, ProgressReporter, TickOutcome,
};
use tracing::debug;

use super::config::load_session_config;
use crate::summary::print_session_summary;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input SER file, image directory or single image
    pub input: PathBuf,

    /// Session config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RGB dominance margin for red/blue flow pixels
    #[arg(long)]
    pub color_threshold: Option<f32>,

    /// Brightness threshold for vessel-wall detection
    #[arg(long)]
    pub wall_threshold: Option<f32>,

    /// Gain of the velocity-to-stress law
    #[arg(long)]
    pub multiplier: Option<f32>,

    /// Number of angular sectors
    #[arg(long)]
    pub sectors: Option<usize>,

    /// Flow ROI as normalised x,y,w,h
    #[arg(long, value_parser = parse_roi)]
    pub flow_roi: Option<NormRect>,

    /// Vessel ROI as normalised x,y,w,h
    #[arg(long, value_parser = parse_roi)]
    pub vessel_roi: Option<NormRect>,

    /// Calibration in pixels per centimetre
    #[arg(long)]
    pub scale: Option<f64>,

    /// Frame rate assumed when the source has no timestamps
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: f64,

    /// Disable the reference-score correction of the stenosis grade
    #[arg(long)]
    pub no_score_correction: bool,

    /// Write per-sector results as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the sampled time series as CSV
    #[arg(long)]
    pub series_csv: Option<PathBuf>,

    /// Save the last stress overlay as PNG
    #[arg(long)]
    pub overlay: Option<PathBuf>,
}

fn parse_roi(s: &str) -> std::result::Result<NormRect, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<std::result::Result<_, _>>()?;
    match values.as_slice() {
        &[x, y, w, h] => Ok(NormRect::new(x, y, w, h)),
        _ => Err(format!("expected x,y,w,h, got {} value(s)", values.len())),
    }
}

struct BarReporter {
    pb: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: AnalysisStage, total_items: Option<usize>) {
        if let Some(total) = total_items {
            self.pb.set_length(total as u64);
        }
        self.pb.set_position(0);
        self.pb.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }
}

fn build_config(args: &AnalyzeArgs) -> Result<SessionConfig> {
    let mut config = match args.config {
        Some(ref path) => load_session_config(path)?,
        None => SessionConfig::default(),
    };

    let analysis = &mut config.analysis;
    if let Some(v) = args.color_threshold {
        analysis.color_threshold = v;
    }
    if let Some(v) = args.wall_threshold {
        analysis.wall_threshold = v;
    }
    if let Some(v) = args.multiplier {
        analysis.stress_multiplier = v;
    }
    if let Some(v) = args.sectors {
        analysis.sector_count = v;
    }
    if args.flow_roi.is_some() {
        analysis.flow_roi = args.flow_roi;
    }
    if args.vessel_roi.is_some() {
        analysis.vessel_roi = args.vessel_roi;
    }
    if let Some(v) = args.scale {
        analysis.scale_px_per_cm = v;
    }
    if args.no_score_correction {
        config.stenosis.score_correction = false;
    }

    config.validate()?;
    debug!(?config, "Resolved session config");
    Ok(config)
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = build_config(args)?;
    let source = open_source(&args.input, args.fps)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let info = source.info();

    println!("ShuntFlow Analysis");
    println!("  Input:    {}", info.name.display());
    println!("  Source:   {} ({}x{})", info.kind, info.width, info.height);
    println!("  Sectors:  {}", config.analysis.sector_count);
    println!();

    let pb = ProgressBar::new(info.total_frames.unwrap_or(0) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { pb: pb.clone() });

    let session = AnalysisSession::new(config)?;
    let mut task = AnalysisTask::with_reporter(source, session, reporter);
    let Some(mut token) = task.start() else {
        bail!("Analysis session is closed");
    };

    let mut last_overlay = None;
    let report = loop {
        match task.tick(token) {
            TickOutcome::Continue(next, output) => {
                if args.overlay.is_some() {
                    last_overlay = Some(output.overlay);
                }
                token = next;
            }
            TickOutcome::Finished(report) => break *report,
            TickOutcome::Paused | TickOutcome::Stopped => {
                bail!("Frame source stopped before the end of the stream")
            }
            TickOutcome::Failed(message) => bail!("Analysis failed: {message}"),
            TickOutcome::Stale => bail!("Analysis tick was invalidated"),
        }
    };
    pb.finish_with_message("Done");

    print_session_summary(&report);

    if let Some(ref path) = args.csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_sector_csv(BufWriter::new(file), &report.sectors)?;
        println!("Sector results saved to {}", path.display());
    }
    if let Some(ref path) = args.series_csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_time_series_csv(BufWriter::new(file), &report.samples)?;
        println!("Time series saved to {}", path.display());
    }
    if let Some(ref path) = args.overlay {
        match last_overlay {
            Some(overlay) => {
                overlay
                    .save(path)
                    .with_context(|| format!("Failed to save overlay {}", path.display()))?;
                println!("Overlay saved to {}", path.display());
            }
            None => println!("No frames processed; overlay not written"),
        }
    }

    Ok(())
}

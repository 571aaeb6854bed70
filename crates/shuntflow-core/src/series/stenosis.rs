//! Rule-based stenosis severity from the WSS / pressure-proxy series.
//!
//! Features are the Pearson correlation of the two series, the lag of the
//! WSS series behind the pressure proxy, and how many WSS peaks coincide
//! with a pressure peak. An ordered rule set maps them to a category; an
//! optional z-score correction can bump a borderline result one step.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{MIN_CORRELATION_SAMPLES, PEAK_SYNC_TOLERANCE, SAMPLE_CADENCE};
use crate::error::{Result, ShuntError};

use super::sampler::{TimeSeriesSample, TimeSeriesSampler};
use super::stats::{cross_correlation_lag, local_peaks, pearson, simultaneous_peak_count};

/// Thresholds of the ordered rule set.
const MILD_MIN_SIM: usize = 50;
const MILD_MIN_LAG: f64 = 0.8;
const MILD_MIN_CORR: f64 = 0.3;
const MODERATE_MIN_SIM: usize = 70;
const MODERATE_MIN_LAG: f64 = 1.5;
const SEVERE_MIN_SIM: usize = 80;
const SEVERE_MIN_LAG: f64 = 2.0;
const SEVERE_MIN_CORR: f64 = 0.75;

/// `mild_score` above which "none" is bumped to "mild".
const BUMP_TO_MILD_SCORE: f64 = 1.0;
/// `mild_score` above which "mild" is bumped to "moderate".
const BUMP_TO_MODERATE_SCORE: f64 = 2.0;

/// Population statistics the correction score is measured against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceStats {
    pub sim_mean: f64,
    pub sim_std: f64,
    pub lag_mean: f64,
    pub lag_std: f64,
    pub corr_center: f64,
    pub corr_width: f64,
}

impl Default for ReferenceStats {
    fn default() -> Self {
        Self {
            sim_mean: 50.0,
            sim_std: 15.0,
            lag_mean: 1.5,
            lag_std: 1.0,
            corr_center: 0.3,
            corr_width: 0.2,
        }
    }
}

impl ReferenceStats {
    /// `z(sim) + z(|lag|) + 0.5 * z(|corr|)`. A zero spread contributes 0.
    pub fn mild_score(&self, features: &StenosisFeatures) -> f64 {
        let z = |value: f64, mean: f64, std: f64| {
            if std > 0.0 {
                (value - mean) / std
            } else {
                0.0
            }
        };
        let score = z(features.simultaneous_peak_count as f64, self.sim_mean, self.sim_std)
            + z(features.lag_sec.abs(), self.lag_mean, self.lag_std)
            + 0.5 * z(features.corr.abs(), self.corr_center, self.corr_width);
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StenosisConfig {
    /// Apply the reference z-score correction after the rule set.
    #[serde(default = "default_score_correction")]
    pub score_correction: bool,
    #[serde(default)]
    pub reference: ReferenceStats,
}

fn default_score_correction() -> bool {
    true
}

impl Default for StenosisConfig {
    fn default() -> Self {
        Self {
            score_correction: true,
            reference: ReferenceStats::default(),
        }
    }
}

impl StenosisConfig {
    pub fn validate(&self) -> Result<()> {
        let r = &self.reference;
        for (name, value) in [
            ("sim_std", r.sim_std),
            ("lag_std", r.lag_std),
            ("corr_width", r.corr_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ShuntError::InvalidConfig(format!(
                    "reference {name} must be a finite value > 0 (got {value})"
                )));
            }
        }
        for (name, value) in [
            ("sim_mean", r.sim_mean),
            ("lag_mean", r.lag_mean),
            ("corr_center", r.corr_center),
        ] {
            if !value.is_finite() {
                return Err(ShuntError::InvalidConfig(format!(
                    "reference {name} must be finite (got {value})"
                )));
            }
        }
        Ok(())
    }
}

/// Features of one session's series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StenosisFeatures {
    pub corr: f64,
    /// Lag of WSS behind the pressure proxy, seconds.
    pub lag_sec: f64,
    pub simultaneous_peak_count: usize,
    pub sample_count: usize,
    /// Seconds between consecutive samples.
    pub dt_sec: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StenosisCategory {
    #[default]
    None,
    Mild,
    Moderate,
    Severe,
}

impl std::fmt::Display for StenosisCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Mild => write!(f, "mild"),
            Self::Moderate => write!(f, "moderate"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StenosisClassification {
    pub category: StenosisCategory,
    /// Set when the reference correction bumped the rule result.
    pub score_corrected: bool,
    /// One line per rule that fired, in evaluation order.
    pub rule_trace: Vec<String>,
    /// Correction score, present when the correction was evaluated.
    pub mild_score: Option<f64>,
}

impl StenosisClassification {
    /// Category with its correction tag, e.g. `mild (score-corrected)`.
    pub fn label(&self) -> String {
        if self.score_corrected {
            format!("{} (score-corrected)", self.category)
        } else {
            self.category.to_string()
        }
    }
}

/// Seconds between samples: `duration * 6 / frames` when the duration is
/// known, else the mean spacing of sample timestamps, else 0.
pub fn sample_interval(
    duration_sec: Option<f64>,
    frames_processed: u64,
    samples: &[TimeSeriesSample],
) -> f64 {
    if let Some(duration) = duration_sec {
        if duration.is_finite() && duration > 0.0 && frames_processed > 0 {
            return duration * SAMPLE_CADENCE as f64 / frames_processed as f64;
        }
    }

    let times: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.time_sec)
        .filter(|t| t.is_finite())
        .collect();
    match (times.first(), times.last()) {
        (Some(first), Some(last)) if times.len() > 1 && last > first => {
            (last - first) / (times.len() - 1) as f64
        }
        _ => 0.0,
    }
}

/// Features of the sampled series, or `None` with fewer than three samples.
pub fn extract_features(sampler: &TimeSeriesSampler, dt_sec: f64) -> Option<StenosisFeatures> {
    if sampler.len() < MIN_CORRELATION_SAMPLES {
        return None;
    }

    let wss = sampler.avg_wss();
    let pressure = sampler.normalized_pressure();

    let corr = pearson(&pressure, &wss);
    let lag = cross_correlation_lag(&pressure, &wss);
    let lag_sec = lag as f64 * dt_sec;
    let simultaneous_peak_count = simultaneous_peak_count(
        &local_peaks(&wss),
        &local_peaks(&pressure),
        PEAK_SYNC_TOLERANCE,
    );

    Some(StenosisFeatures {
        corr,
        lag_sec: if lag_sec.is_finite() { lag_sec } else { 0.0 },
        simultaneous_peak_count,
        sample_count: sampler.len(),
        dt_sec,
    })
}

/// Apply the ordered rule set, then the optional correction.
pub fn classify(features: &StenosisFeatures, config: &StenosisConfig) -> StenosisClassification {
    let sim = features.simultaneous_peak_count;
    let lag = features.lag_sec.abs();
    let corr = features.corr.abs();

    let mut category = StenosisCategory::None;
    let mut rule_trace = vec![format!(
        "features: sim={sim}, |lag|={lag:.2}s, |corr|={corr:.3}"
    )];

    if sim >= MILD_MIN_SIM || lag >= MILD_MIN_LAG || corr >= MILD_MIN_CORR {
        category = StenosisCategory::Mild;
        rule_trace.push(format!(
            "mild: sim >= {MILD_MIN_SIM} or |lag| >= {MILD_MIN_LAG}s or |corr| >= {MILD_MIN_CORR}"
        ));
        if sim >= MODERATE_MIN_SIM || lag >= MODERATE_MIN_LAG {
            category = StenosisCategory::Moderate;
            rule_trace.push(format!(
                "moderate: sim >= {MODERATE_MIN_SIM} or |lag| >= {MODERATE_MIN_LAG}s"
            ));
        }
    }

    if (sim >= SEVERE_MIN_SIM && lag >= SEVERE_MIN_LAG) || corr >= SEVERE_MIN_CORR {
        category = StenosisCategory::Severe;
        rule_trace.push(format!(
            "severe: (sim >= {SEVERE_MIN_SIM} and |lag| >= {SEVERE_MIN_LAG}s) or |corr| >= {SEVERE_MIN_CORR}"
        ));
    }

    let mut score_corrected = false;
    let mut mild_score = None;
    if config.score_correction {
        let score = config.reference.mild_score(features);
        mild_score = Some(score);
        let bumped = match category {
            StenosisCategory::None if score > BUMP_TO_MILD_SCORE => Some(StenosisCategory::Mild),
            StenosisCategory::Mild if score > BUMP_TO_MODERATE_SCORE => {
                Some(StenosisCategory::Moderate)
            }
            _ => None,
        };
        if let Some(next) = bumped {
            rule_trace.push(format!(
                "score correction: mild_score={score:.2} bumps {category} to {next}"
            ));
            category = next;
            score_corrected = true;
        }
    }

    if rule_trace.len() == 1 {
        rule_trace.push("none: no rule fired".into());
    }

    StenosisClassification {
        category,
        score_corrected,
        rule_trace,
        mild_score,
    }
}

/// Features (when there were enough samples) and the resulting category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StenosisReport {
    pub features: Option<StenosisFeatures>,
    pub classification: StenosisClassification,
}

/// End-of-session assessment of the sampled series.
///
/// Fewer than three samples yields category "none" without features.
pub fn assess_stenosis(
    sampler: &TimeSeriesSampler,
    duration_sec: Option<f64>,
    frames_processed: u64,
    config: &StenosisConfig,
) -> StenosisReport {
    let samples = sampler.samples();
    let dt = sample_interval(duration_sec, frames_processed, &samples);

    let Some(features) = extract_features(sampler, dt) else {
        debug!(samples = sampler.len(), "Too few samples for stenosis features");
        return StenosisReport {
            features: None,
            classification: StenosisClassification {
                rule_trace: vec![format!(
                    "insufficient samples ({} < {MIN_CORRELATION_SAMPLES}): none",
                    sampler.len()
                )],
                ..Default::default()
            },
        };
    };

    let classification = classify(&features, config);
    info!(
        category = %classification.label(),
        corr = features.corr,
        lag_sec = features.lag_sec,
        simultaneous_peaks = features.simultaneous_peak_count,
        "Stenosis classified"
    );
    StenosisReport {
        features: Some(features),
        classification,
    }
}

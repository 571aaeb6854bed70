//! Periodic signal sampling and the stenosis classifier built on it.

pub mod sampler;
pub mod stats;
pub mod stenosis;

pub use sampler::{TimeSeriesSample, TimeSeriesSampler};
pub use stats::{cross_correlation_lag, local_peaks, pearson, simultaneous_peak_count};
pub use stenosis::{
    assess_stenosis, classify, extract_features, sample_interval, ReferenceStats,
    StenosisCategory, StenosisClassification, StenosisConfig, StenosisFeatures, StenosisReport,
};

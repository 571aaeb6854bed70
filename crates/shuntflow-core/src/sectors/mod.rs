pub mod accumulator;
pub mod summary;

pub use accumulator::{sector_angle, sector_index, SectorAccumulator, SectorBin};
pub use summary::{summarize, summarize_bin, SectorResult};

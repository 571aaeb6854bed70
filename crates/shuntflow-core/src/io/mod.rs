pub mod sequence;
pub mod ser;
pub mod source;

use std::path::Path;

use crate::error::Result;

pub use sequence::ImageSequenceSource;
pub use ser::{SerFrameSource, SerReader};
pub use source::{FrameSource, MemoryFrameSource, SourcePoll};

/// Open a SER file, an image directory or a single image as a frame source.
pub fn open_source(path: &Path, fps: f64) -> Result<Box<dyn FrameSource>> {
    if path.is_dir() {
        return Ok(Box::new(ImageSequenceSource::open(path, fps)?));
    }
    let is_ser = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ser"));
    if is_ser {
        Ok(Box::new(SerFrameSource::open(path, fps)?))
    } else {
        Ok(Box::new(ImageSequenceSource::single(path, fps)?))
    }
}

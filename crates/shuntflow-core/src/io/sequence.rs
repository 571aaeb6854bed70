use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::DEFAULT_FPS;
use crate::error::{Result, ShuntError};
use crate::frame::{FrameMetadata, RgbaFrame, SourceInfo, SourceKind};

use super::source::{FrameSource, SourcePoll};

const FRAME_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

pub fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Directory of still images played back in file-name order at a fixed rate.
pub struct ImageSequenceSource {
    root: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    fps: f64,
    width: u32,
    height: u32,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, fps: f64) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_frame_image(p))
            .collect();
        files.sort();
        Self::from_files(dir, files, fps)
    }

    /// A single image as a one-frame stream.
    pub fn single(path: &Path, fps: f64) -> Result<Self> {
        Self::from_files(path, vec![path.to_path_buf()], fps)
    }

    fn from_files(root: &Path, files: Vec<PathBuf>, fps: f64) -> Result<Self> {
        let first = files.first().ok_or(ShuntError::EmptySequence)?;
        let (width, height) = image::image_dimensions(first)?;
        debug!(path = %root.display(), frames = files.len(), width, height, "Opened image sequence");
        Ok(Self {
            root: root.to_path_buf(),
            files,
            next: 0,
            fps: if fps.is_finite() && fps > 0.0 { fps } else { DEFAULT_FPS },
            width,
            height,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSource for ImageSequenceSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.root.clone(),
            kind: SourceKind::ImageSequence,
            total_frames: Some(self.files.len()),
            width: self.width,
            height: self.height,
            duration_sec: self.duration_sec(),
        }
    }

    fn poll_frame(&mut self) -> Result<SourcePoll> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(SourcePoll::Ended);
        };
        let image = image::open(path)?.to_rgba8();
        if image.dimensions() != (self.width, self.height) {
            let (width, height) = image.dimensions();
            return Err(ShuntError::InvalidDimensions { width, height });
        }
        let frame = RgbaFrame::new(image).with_metadata(FrameMetadata {
            frame_index: self.next,
            timestamp_sec: Some(self.next as f64 / self.fps),
        });
        self.next += 1;
        Ok(SourcePoll::Frame(frame))
    }

    fn duration_sec(&self) -> Option<f64> {
        Some(self.files.len() as f64 / self.fps)
    }
}

use std::path::PathBuf;

use image::RgbaImage;

use crate::consts::RGBA_CHANNELS;
use crate::error::{Result, ShuntError};

/// A single decoded video frame, RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct RgbaFrame {
    pub image: RgbaImage,
    pub metadata: FrameMetadata,
}

impl RgbaFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            metadata: FrameMetadata::default(),
        }
    }

    /// Wrap a raw RGBA8 buffer; the length must be `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ShuntError::InvalidDimensions { width, height });
        }
        let image = RgbaImage::from_raw(width, height, data)
            .ok_or(ShuntError::InvalidDimensions { width, height })?;
        Ok(Self::new(image))
    }

    pub fn with_metadata(mut self, metadata: FrameMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Interleaved RGBA bytes.
    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// RGB triple at `(x, y)`. Caller guarantees bounds.
    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width() + x) * RGBA_CHANNELS;
        let data = self.data();
        [data[i], data[i + 1], data[i + 2]]
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
    /// Presentation time from the start of the stream, when the source knows it.
    pub timestamp_sec: Option<f64>,
}

/// Kind of container a frame stream is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Ser,
    ImageSequence,
    Memory,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ser => write!(f, "SER"),
            Self::ImageSequence => write!(f, "Image sequence"),
            Self::Memory => write!(f, "Memory"),
        }
    }
}

/// Metadata about a frame source.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub name: PathBuf,
    pub kind: SourceKind,
    pub total_frames: Option<usize>,
    pub width: u32,
    pub height: u32,
    pub duration_sec: Option<f64>,
}

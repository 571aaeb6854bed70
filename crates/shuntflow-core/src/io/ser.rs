use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use tracing::debug;

use crate::consts::{DEFAULT_FPS, SER_TICKS_PER_SECOND};
use crate::error::{Result, ShuntError};
use crate::frame::{FrameMetadata, RgbaFrame, SourceInfo, SourceKind};

use super::source::{FrameSource, SourcePoll};

pub const SER_HEADER_SIZE: usize = 178;
pub const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// Colour layouts this reader can turn into RGBA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerColor {
    Mono,
    Rgb,
    Bgr,
}

impl SerColor {
    fn from_id(color_id: i32) -> Result<Self> {
        match color_id {
            0 => Ok(Self::Mono),
            100 => Ok(Self::Rgb),
            101 => Ok(Self::Bgr),
            8..=19 => Err(ShuntError::UnsupportedColorLayout(format!(
                "Bayer pattern (SER colour id {color_id}) needs debayering"
            ))),
            other => Err(ShuntError::UnsupportedColorLayout(format!(
                "SER colour id {other}"
            ))),
        }
    }

    pub fn planes(&self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Rgb | Self::Bgr => 3,
        }
    }
}

/// SER file header (178 bytes).
#[derive(Clone, Copy, Debug)]
pub struct SerHeader {
    pub color: SerColor,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 {
            1
        } else {
            2
        }
    }

    pub fn frame_byte_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(self.bytes_per_sample() * self.color.planes()))
            .ok_or(ShuntError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }
}

/// Memory-mapped SER file reader producing RGBA8 frames.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
    frame_size: usize,
}

impl SerReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the file is not modified while open.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(ShuntError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(ShuntError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let frame_size = header.frame_byte_size()?;
        let expected = frame_size
            .checked_mul(header.frame_count as usize)
            .and_then(|n| n.checked_add(SER_HEADER_SIZE))
            .ok_or_else(|| ShuntError::InvalidSer("Frame data size overflows".into()))?;
        if mmap.len() < expected {
            return Err(ShuntError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            frame_size,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let total = self.frame_count();
        if index >= total {
            return Err(ShuntError::FrameIndexOutOfRange { index, total });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_size;
        Ok(&self.mmap[offset..offset + self.frame_size])
    }

    /// Decode frame `index` to RGBA8; deeper samples keep their top 8 bits.
    pub fn read_frame(&self, index: usize) -> Result<RgbaFrame> {
        let raw = self.frame_raw(index)?;
        let h = self.header;
        let bps = h.bytes_per_sample();
        let planes = h.color.planes();
        let shift = h.pixel_depth.saturating_sub(8).min(8);

        let sample = |i: usize| -> u8 {
            if bps == 1 {
                raw[i]
            } else {
                let pair = [raw[i], raw[i + 1]];
                let v = if h.little_endian {
                    u16::from_le_bytes(pair)
                } else {
                    u16::from_be_bytes(pair)
                };
                (v >> shift).min(255) as u8
            }
        };

        let pixels = h.width as usize * h.height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for p in 0..pixels {
            let base = p * planes * bps;
            let rgb = match h.color {
                SerColor::Mono => {
                    let v = sample(base);
                    [v, v, v]
                }
                SerColor::Rgb => [sample(base), sample(base + bps), sample(base + 2 * bps)],
                SerColor::Bgr => [sample(base + 2 * bps), sample(base + bps), sample(base)],
            };
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }

        let frame = RgbaFrame::from_raw(h.width, h.height, data)?;
        Ok(frame.with_metadata(FrameMetadata {
            frame_index: index,
            timestamp_sec: self.relative_time(index),
        }))
    }

    /// Raw trailer timestamp of frame `index`, in 100 ns ticks.
    fn read_timestamp(&self, index: usize) -> Option<u64> {
        let trailer = SER_HEADER_SIZE + self.frame_size * self.frame_count();
        let offset = trailer + index * 8;
        let bytes = self.mmap.get(offset..offset + 8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    fn relative_time(&self, index: usize) -> Option<f64> {
        let first = self.read_timestamp(0)?;
        let ts = self.read_timestamp(index)?;
        (ts >= first).then(|| (ts - first) as f64 / SER_TICKS_PER_SECOND)
    }

    /// Playback duration from the timestamp trailer, if it is present and increasing.
    pub fn trailer_duration(&self) -> Option<f64> {
        let n = self.frame_count();
        if n < 2 {
            return None;
        }
        let span = self.relative_time(n - 1)?;
        (span > 0.0).then(|| span * n as f64 / (n - 1) as f64)
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]);

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(ShuntError::InvalidDimensions {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(ShuntError::InvalidSer(format!(
            "Unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count < 0 {
        return Err(ShuntError::InvalidSer(format!(
            "Negative frame count {frame_count}"
        )));
    }

    Ok(SerHeader {
        color: SerColor::from_id(color_id)?,
        // Most writers store 0 for little-endian data despite the format notes.
        little_endian: le_flag != 1,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
    })
}

/// SER file replayed as a frame stream.
pub struct SerFrameSource {
    path: PathBuf,
    reader: SerReader,
    next: usize,
    fps: f64,
}

impl SerFrameSource {
    /// `fps` is used for the duration when the file has no timestamp trailer.
    pub fn open(path: &Path, fps: f64) -> Result<Self> {
        let reader = SerReader::open(path)?;
        debug!(
            path = %path.display(),
            frames = reader.frame_count(),
            width = reader.header.width,
            height = reader.header.height,
            "Opened SER source"
        );
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            next: 0,
            fps: if fps.is_finite() && fps > 0.0 { fps } else { DEFAULT_FPS },
        })
    }

    pub fn reader(&self) -> &SerReader {
        &self.reader
    }
}

impl FrameSource for SerFrameSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: self.path.clone(),
            kind: SourceKind::Ser,
            total_frames: Some(self.reader.frame_count()),
            width: self.reader.header.width,
            height: self.reader.header.height,
            duration_sec: self.duration_sec(),
        }
    }

    fn poll_frame(&mut self) -> Result<SourcePoll> {
        if self.next >= self.reader.frame_count() {
            return Ok(SourcePoll::Ended);
        }
        let mut frame = self.reader.read_frame(self.next)?;
        if frame.metadata.timestamp_sec.is_none() {
            frame.metadata.timestamp_sec = Some(self.next as f64 / self.fps);
        }
        self.next += 1;
        Ok(SourcePoll::Frame(frame))
    }

    fn duration_sec(&self) -> Option<f64> {
        self.reader
            .trailer_duration()
            .or(Some(self.reader.frame_count() as f64 / self.fps))
    }
}

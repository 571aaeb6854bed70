use std::collections::VecDeque;
use std::path::PathBuf;

use crate::consts::DEFAULT_FPS;
use crate::error::Result;
use crate::frame::{FrameMetadata, RgbaFrame, SourceInfo, SourceKind};

/// Result of asking a source for its next frame.
#[derive(Clone, Debug)]
pub enum SourcePoll {
    Frame(RgbaFrame),
    /// Playback is paused; polling again later may yield more frames.
    Paused,
    /// End of stream; the session should finalize.
    Ended,
    /// The source went away (e.g. replaced); stop without finalizing.
    Detached,
}

/// A decoded frame stream feeding an analysis task.
pub trait FrameSource {
    fn info(&self) -> SourceInfo;

    fn poll_frame(&mut self) -> Result<SourcePoll>;

    /// Total playback duration, when known.
    fn duration_sec(&self) -> Option<f64>;

    fn frame_count_hint(&self) -> Option<usize> {
        self.info().total_frames
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn info(&self) -> SourceInfo {
        (**self).info()
    }

    fn poll_frame(&mut self) -> Result<SourcePoll> {
        (**self).poll_frame()
    }

    fn duration_sec(&self) -> Option<f64> {
        (**self).duration_sec()
    }

    fn frame_count_hint(&self) -> Option<usize> {
        (**self).frame_count_hint()
    }
}

/// Scripted in-memory source: frames and playback events are replayed in
/// order, then `Ended` forever.
#[derive(Clone, Debug)]
pub struct MemoryFrameSource {
    events: VecDeque<SourcePoll>,
    frame_total: usize,
    width: u32,
    height: u32,
    fps: f64,
}

impl MemoryFrameSource {
    /// Frames are stamped with their index and `index / fps` seconds.
    pub fn new(frames: Vec<RgbaFrame>, fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { DEFAULT_FPS };
        let (width, height) = frames
            .first()
            .map_or((0, 0), |f| (f.width() as u32, f.height() as u32));
        let frame_total = frames.len();
        let events = frames
            .into_iter()
            .enumerate()
            .map(|(i, frame)| {
                SourcePoll::Frame(frame.with_metadata(FrameMetadata {
                    frame_index: i,
                    timestamp_sec: Some(i as f64 / fps),
                }))
            })
            .collect();
        Self {
            events,
            frame_total,
            width,
            height,
            fps,
        }
    }

    /// Insert a playback event before the frame at `position` of the remaining queue.
    pub fn insert_event(&mut self, position: usize, event: SourcePoll) {
        let position = position.min(self.events.len());
        self.events.insert(position, event);
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl FrameSource for MemoryFrameSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            name: PathBuf::from("<memory>"),
            kind: SourceKind::Memory,
            total_frames: Some(self.frame_total),
            width: self.width,
            height: self.height,
            duration_sec: self.duration_sec(),
        }
    }

    fn poll_frame(&mut self) -> Result<SourcePoll> {
        Ok(self.events.pop_front().unwrap_or(SourcePoll::Ended))
    }

    fn duration_sec(&self) -> Option<f64> {
        Some(self.frame_total as f64 / self.fps)
    }
}

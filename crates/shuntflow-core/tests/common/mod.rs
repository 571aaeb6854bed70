#![allow(dead_code)]

use shuntflow_core::frame::RgbaFrame;
use shuntflow_core::io::ser::SER_HEADER_SIZE;

pub const GRAY: [u8; 3] = [100, 100, 100];
pub const RED: [u8; 3] = [200, 0, 0];
pub const BLUE: [u8; 3] = [0, 0, 200];

/// Frame whose pixel colours come from `f(x, y)`.
pub fn frame_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> RgbaFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = f(x, y);
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }
    RgbaFrame::from_raw(width, height, data).expect("valid frame")
}

pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> RgbaFrame {
    frame_from_fn(width, height, |_, _| rgb)
}

/// Gray frame with a filled square of `rgb` covering `[x0, x0 + size) x [y0, y0 + size)`.
pub fn square_frame(width: u32, height: u32, x0: u32, y0: u32, size: u32, rgb: [u8; 3]) -> RgbaFrame {
    frame_from_fn(width, height, |x, y| {
        if x >= x0 && x < x0 + size && y >= y0 && y < y0 + size {
            rgb
        } else {
            GRAY
        }
    })
}

/// Build a SER header with configurable bit depth and color id.
pub fn build_ser_header(width: u32, height: u32, bit_depth: u32, num_frames: usize, color_id: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);
    buf.extend_from_slice(b"LUCAM-RECORDER");
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&color_id.to_le_bytes());
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    buf.extend_from_slice(&[0u8; 120]);
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete SER buffer: header, raw frames, then optional timestamp trailer.
pub fn build_ser(
    width: u32,
    height: u32,
    bit_depth: u32,
    color_id: i32,
    frames: &[Vec<u8>],
    timestamps: Option<&[u64]>,
) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, bit_depth, frames.len(), color_id);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    if let Some(ts) = timestamps {
        for t in ts {
            buf.extend_from_slice(&t.to_le_bytes());
        }
    }
    buf
}

/// Write a buffer to a temporary `.ser` file that lives as long as the handle.
pub fn write_test_ser(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::Builder::new()
        .suffix(".ser")
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write SER data");
    f.flush().expect("flush");
    f
}

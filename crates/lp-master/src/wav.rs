//! Offline capture: an in-memory sink and 16-bit stereo WAV encoding.

use lp_audio::{AudioSink, SinkStatus};
use lp_core::Frame;
use std::io::Write;

/// Sink that records every frame written to it.
///
/// It behaves like a device that is always comfortably full: each write
/// reports a second's worth of queued audio and no free room, so the
/// frame loop never sees a low buffer and presents every frame.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    rate: u32,
    frames: Vec<Frame>,
}

impl CaptureSink {
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            frames: Vec::new(),
        }
    }

    /// Preallocate room for `frames` device-rate frames.
    pub fn with_capacity(rate: u32, frames: usize) -> Self {
        Self {
            rate,
            frames: Vec::with_capacity(frames),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn to_wav(&self) -> Vec<u8> {
        frames_to_wav(&self.frames, self.rate)
    }
}

impl AudioSink for CaptureSink {
    fn rate(&self) -> u32 {
        self.rate
    }

    fn write(&mut self, frames: &[Frame]) -> SinkStatus {
        self.frames.extend_from_slice(frames);
        SinkStatus {
            rate: self.rate,
            from_underrun: self.rate as i64,
            from_overflow: 0,
        }
    }
}

const CHANNELS: u16 = 2;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * (BITS_PER_SAMPLE / 8);

pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let data_size = frames.len() as u32 * BLOCK_ALIGN as u32;

    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?; // PCM
    w.write_all(&CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes())?;
    w.write_all(&BLOCK_ALIGN.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        w.write_all(&frame.left.to_le_bytes())?;
        w.write_all(&frame.right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * BLOCK_ALIGN as usize);
    write_wav(&mut buf, frames, sample_rate).expect("Vec<u8> write cannot fail");
    buf
}

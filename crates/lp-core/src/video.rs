//! Video frame buffer and presentation contract.

use alloc::vec;
use alloc::vec::Vec;

pub const VIDEO_WIDTH: usize = 160;
pub const VIDEO_HEIGHT: usize = 144;

/// An XRGB8888 picture with an explicit row pitch (in pixels).
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    pitch: usize,
}

impl VideoFrame {
    /// Create a black frame with `pitch == width`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
            pitch: width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// One row of pixels.
    pub fn row(&self, y: usize) -> &[u32] {
        let start = y * self.pitch;
        &self.pixels[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        let start = y * self.pitch;
        let width = self.width;
        &mut self.pixels[start..start + width]
    }
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self::new(VIDEO_WIDTH, VIDEO_HEIGHT)
    }
}

/// Where completed frames are blitted.
pub trait VideoSink {
    fn present(&mut self, frame: &VideoFrame);
}

/// Discards every frame. Used for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullVideo;

impl VideoSink for NullVideo {
    fn present(&mut self, _frame: &VideoFrame) {}
}

//! Audio sink trait and error types.

use lp_core::Frame;
use thiserror::Error;

/// Error type for opening and running an audio device.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Open parameters the sink cannot honour
    #[error("unsupported stream parameters: {0}")]
    Unsupported(String),
}

/// Device buffer telemetry returned by every write.
///
/// `from_underrun` is how many frames were queued before the write (the
/// distance from running dry); `from_overflow` is how many free slots
/// there were (the distance from dropping frames). `rate` is the rate the
/// device is actually consuming at, as best the sink can tell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkStatus {
    pub rate: u32,
    pub from_underrun: i64,
    pub from_overflow: i64,
}

/// An open audio device that accepts device-rate frames.
pub trait AudioSink {
    /// Rate the stream was opened at.
    fn rate(&self) -> u32;

    /// Queue frames for playback without blocking.
    fn write(&mut self, frames: &[Frame]) -> SinkStatus;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn rate(&self) -> u32 {
        (**self).rate()
    }

    fn write(&mut self, frames: &[Frame]) -> SinkStatus {
        (**self).write(frames)
    }
}

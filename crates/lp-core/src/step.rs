//! Emulation step contract.

use crate::frame::Frame;
use crate::video::VideoFrame;

/// Outcome of one emulation step.
///
/// `offset` is the index of the first sample that belongs to the *next*
/// video frame; everything before it completes the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// Ran `produced` frames without reaching the end of a video frame.
    Ran { produced: usize },
    /// Ran `produced` frames and completed a video frame at `offset`.
    FrameDone { produced: usize, offset: usize },
}

impl StepResult {
    /// Build a result from the "negative means no boundary" convention
    /// used by cores with a C-style `run_for`.
    pub fn from_sentinel(produced: usize, offset: isize) -> Self {
        if offset < 0 {
            StepResult::Ran { produced }
        } else {
            StepResult::FrameDone {
                produced,
                offset: offset as usize,
            }
        }
    }

    /// Number of frames written into the audio buffer.
    pub fn produced(&self) -> usize {
        match *self {
            StepResult::Ran { produced } | StepResult::FrameDone { produced, .. } => produced,
        }
    }

    /// Boundary offset, present only when a video frame completed.
    pub fn frame_offset(&self) -> Option<usize> {
        match *self {
            StepResult::Ran { .. } => None,
            StepResult::FrameDone { offset, .. } => Some(offset),
        }
    }
}

/// The emulated machine, driven once per loop iteration.
pub trait EmulationCore {
    /// Run until `requested` frames have been produced or a video frame
    /// completes, whichever comes first.
    ///
    /// `audio` always has room for `requested + MAX_OVERPRODUCTION` frames;
    /// the core may overshoot `requested` by at most that headroom, and
    /// may leave at most that many frames after a completed video frame.
    /// The finished picture is left in `video`.
    fn run_for(&mut self, video: &mut VideoFrame, audio: &mut [Frame], requested: usize)
        -> StepResult;

    /// Drive the serial link port (enable, disable, shift-in).
    fn link_status(&mut self, _status: u16) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_sentinel_means_no_boundary() {
        let result = StepResult::from_sentinel(35_112, -1);
        assert_eq!(result, StepResult::Ran { produced: 35_112 });
        assert_eq!(result.frame_offset(), None);
    }

    #[test]
    fn non_negative_sentinel_carries_offset() {
        let result = StepResult::from_sentinel(36_500, 35_000);
        assert_eq!(result.produced(), 36_500);
        assert_eq!(result.frame_offset(), Some(35_000));
    }

    #[test]
    fn zero_offset_is_a_boundary() {
        assert_eq!(StepResult::from_sentinel(10, 0).frame_offset(), Some(0));
    }
}

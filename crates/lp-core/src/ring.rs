//! Sample accounting across video-frame boundaries.

use alloc::vec;
use alloc::vec::Vec;

use crate::frame::Frame;
use crate::step::EmulationCore;
use crate::video::VideoFrame;

/// Result of one [`SampleRing::run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Frames ready for output (the prefix returned by [`SampleRing::ready`]).
    pub ready: usize,
    /// Frames past the boundary, carried into the next iteration.
    pub leftover: usize,
    /// Frames the core produced this step.
    pub produced: usize,
    /// Whether a video frame completed this step.
    pub frame_done: bool,
}

/// Buffer the emulation core writes into, plus the count of frames
/// carried over from the previous step.
///
/// Layout after `run`: `[ready | leftover | unused]`. `compact` moves
/// the leftover to the front, where the next `run` appends after it.
/// Storage is allocated once; `run` and `compact` never allocate.
#[derive(Clone, Debug)]
pub struct SampleRing {
    buf: Vec<Frame>,
    target: usize,
    headroom: usize,
    /// Frames at the front that belong to the next output batch.
    pending: usize,
    /// Length of the ready prefix, zero once compacted.
    ready: usize,
}

impl SampleRing {
    /// `target` is the nominal frame count per video frame, `headroom`
    /// the largest overshoot a single step may produce.
    pub fn new(target: usize, headroom: usize) -> Self {
        Self {
            buf: vec![Frame::silence(); target + headroom],
            target,
            headroom,
            pending: 0,
            ready: 0,
        }
    }

    /// Frames carried over and waiting at the front of the buffer.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// How many frames the next step should be asked for.
    pub fn request(&self) -> usize {
        self.target.saturating_sub(self.pending)
    }

    /// Run one emulation step, appending after the pending frames.
    ///
    /// # Panics
    ///
    /// If the core breaks its contract: producing more than the request
    /// plus headroom, placing the boundary past the produced frames, or
    /// leaving more than `headroom` frames after the boundary.
    pub fn run<C>(&mut self, core: &mut C, video: &mut VideoFrame) -> Batch
    where
        C: EmulationCore + ?Sized,
    {
        assert_eq!(self.ready, 0, "compact() must follow every run()");

        let start = self.pending;
        let requested = self.request();
        let result = core.run_for(video, &mut self.buf[start..], requested);

        let produced = result.produced();
        assert!(
            produced <= requested + self.headroom,
            "core produced {} frames for a request of {} (headroom {})",
            produced,
            requested,
            self.headroom
        );

        let ready = match result.frame_offset() {
            Some(offset) => {
                assert!(
                    offset <= produced,
                    "frame boundary at {} past {} produced frames",
                    offset,
                    produced
                );
                start + offset
            }
            None => start + produced,
        };

        let leftover = start + produced - ready;
        assert!(
            leftover <= self.headroom,
            "{} frames left after the boundary (headroom {})",
            leftover,
            self.headroom
        );

        self.pending = leftover;
        self.ready = ready;

        Batch {
            ready,
            leftover,
            produced,
            frame_done: result.frame_offset().is_some(),
        }
    }

    /// Frames completed by the last `run`, in production order.
    pub fn ready(&self) -> &[Frame] {
        &self.buf[..self.ready]
    }

    /// Move the leftover tail to the front of the buffer.
    pub fn compact(&mut self) {
        if self.ready > 0 {
            self.buf
                .copy_within(self.ready..self.ready + self.pending, 0);
        }
        self.ready = 0;
    }
}

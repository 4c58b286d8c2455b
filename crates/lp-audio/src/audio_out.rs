//! Resample-and-write stage between the frame loop and the device.

use lp_core::{Frame, NOMINAL_SAMPLE_RATE};

use crate::resampler::{Resampler, ResamplerFactory};
use crate::traits::{AudioSink, SinkStatus};

/// Result of one [`AudioOut::write`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioStatus {
    /// Rate the device reports it is consuming at (0 if unknown).
    pub rate: u32,
    /// The device buffer is closer to running dry than to overflowing.
    pub low: bool,
}

/// Buffer-pressure heuristic over the sink's counters.
///
/// `outsamples` is the size of the batch just written.
pub fn is_low(from_underrun: i64, from_overflow: i64, outsamples: i64) -> bool {
    from_underrun + outsamples < (from_overflow - outsamples) * 2
}

/// Owns the resampler and the sink.
///
/// The output buffer is sized once from the maximum input batch, so
/// `write` never allocates.
pub struct AudioOut<R, S> {
    resampler: R,
    sink: S,
    buf: Vec<Frame>,
    max_in: usize,
}

impl<R: Resampler, S: AudioSink> AudioOut<R, S> {
    /// Build for input at the nominal emulation rate.
    pub fn new<F>(factory: &F, sink: S, max_in: usize) -> Self
    where
        F: ResamplerFactory<Output = R>,
    {
        Self::with_input_rate(factory, sink, NOMINAL_SAMPLE_RATE, max_in)
    }

    pub fn with_input_rate<F>(factory: &F, sink: S, in_rate: u32, max_in: usize) -> Self
    where
        F: ResamplerFactory<Output = R>,
    {
        let resampler = factory.create(in_rate, sink.rate(), max_in);
        let buf = vec![Frame::silence(); resampler.max_out(max_in)];
        Self {
            resampler,
            sink,
            buf,
            max_in,
        }
    }

    /// Rate the sink was opened at.
    pub fn output_rate(&self) -> u32 {
        self.sink.rate()
    }

    pub fn max_in(&self) -> usize {
        self.max_in
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Resample `frames`, queue them on the sink and derive the low flag.
    ///
    /// # Panics
    ///
    /// If `frames` is longer than the `max_in` this was built for.
    pub fn write(&mut self, frames: &[Frame]) -> AudioStatus {
        assert!(
            frames.len() <= self.max_in,
            "batch of {} exceeds resampler capacity {}",
            frames.len(),
            self.max_in
        );

        let out = self.resampler.resample(&mut self.buf, frames);
        let SinkStatus {
            rate,
            from_underrun,
            from_overflow,
        } = self.sink.write(&self.buf[..out]);

        AudioStatus {
            rate,
            low: is_low(from_underrun, from_overflow, out as i64),
        }
    }
}

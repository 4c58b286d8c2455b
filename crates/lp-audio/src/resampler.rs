//! Sample-rate conversion contract and a linear-interpolation default.

use lp_core::Frame;

/// Stateful stream converter from a fixed input rate to an output rate.
///
/// Phase is carried across calls: converting a stream in pieces yields
/// the same frames as converting it whole.
pub trait Resampler: Send {
    fn in_rate(&self) -> u32;

    fn out_rate(&self) -> u32;

    /// Upper bound on frames produced from `max_in` input frames.
    fn max_out(&self, max_in: usize) -> usize;

    /// Convert `input`, writing into the front of `out`. Returns the
    /// number of frames written. `out` must hold `max_out(input.len())`.
    fn resample(&mut self, out: &mut [Frame], input: &[Frame]) -> usize;
}

/// Builds resamplers sized for a known maximum input batch.
pub trait ResamplerFactory {
    type Output: Resampler;

    fn create(&self, in_rate: u32, out_rate: u32, max_in: usize) -> Self::Output;
}

/// Linear interpolation between neighbouring input frames.
///
/// Position is tracked exactly as a rational number of input frames with
/// denominator `out_rate`, so the output count never drifts: after any
/// sequence of calls totalling `n` input frames, the total output is
/// `ceil(n * out_rate / in_rate)`. No band-limiting is applied.
#[derive(Clone, Debug)]
pub struct LinearResampler {
    in_rate: u32,
    out_rate: u32,
    /// Position of the next output frame, in units of `1 / out_rate`
    /// input frames, relative to `prev`.
    pos: u64,
    /// Last input frame of the previous call.
    prev: Frame,
}

impl LinearResampler {
    /// # Panics
    ///
    /// If either rate is zero.
    pub fn new(in_rate: u32, out_rate: u32) -> Self {
        assert!(in_rate > 0 && out_rate > 0, "resampler rates must be positive");
        Self {
            in_rate,
            out_rate,
            pos: 0,
            prev: Frame::silence(),
        }
    }

    fn lerp(a: i16, b: i16, frac: u64, den: u64) -> i16 {
        let a = a as i64;
        let b = b as i64;
        (a + (b - a) * frac as i64 / den as i64) as i16
    }
}

impl Resampler for LinearResampler {
    fn in_rate(&self) -> u32 {
        self.in_rate
    }

    fn out_rate(&self) -> u32 {
        self.out_rate
    }

    fn max_out(&self, max_in: usize) -> usize {
        (max_in as u64 * self.out_rate as u64 / self.in_rate as u64) as usize + 1
    }

    fn resample(&mut self, out: &mut [Frame], input: &[Frame]) -> usize {
        if input.is_empty() {
            return 0;
        }

        let den = self.out_rate as u64;
        let step = self.in_rate as u64;
        let end = input.len() as u64 * den;
        let sample = |i: u64| -> Frame {
            if i == 0 {
                self.prev
            } else {
                input[i as usize - 1]
            }
        };

        let mut written = 0;
        while self.pos < end && written < out.len() {
            let i = self.pos / den;
            let frac = self.pos % den;
            let a = sample(i);
            let b = sample(i + 1);
            out[written] = Frame {
                left: Self::lerp(a.left, b.left, frac, den),
                right: Self::lerp(a.right, b.right, frac, den),
            };
            written += 1;
            self.pos += step;
        }

        self.pos = self.pos.saturating_sub(end);
        self.prev = input[input.len() - 1];
        written
    }
}

/// Factory for [`LinearResampler`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearFactory;

impl ResamplerFactory for LinearFactory {
    type Output = LinearResampler;

    fn create(&self, in_rate: u32, out_rate: u32, _max_in: usize) -> LinearResampler {
        LinearResampler::new(in_rate, out_rate)
    }
}

//! Estimate of the rate a device actually consumes frames at.

/// Observation window before an estimate is published.
const WINDOW_US: u64 = 1_000_000;

/// Smoothed consumption rate from (frames, elapsed time) observations.
///
/// Observations accumulate until a full second has been seen; each full
/// window yields a rate that is folded into the estimate as
/// `(3 * estimate + rate) / 4`. Until the first window completes the
/// nominal rate is reported.
#[derive(Clone, Debug)]
pub struct RateEstimator {
    nominal: u32,
    estimate: Option<u32>,
    frames: u64,
    usecs: u64,
}

impl RateEstimator {
    pub fn new(nominal: u32) -> Self {
        Self {
            nominal,
            estimate: None,
            frames: 0,
            usecs: 0,
        }
    }

    /// Best current guess, the nominal rate if nothing is known yet.
    pub fn rate(&self) -> u32 {
        self.estimate.unwrap_or(self.nominal)
    }

    pub fn is_settled(&self) -> bool {
        self.estimate.is_some()
    }

    /// Record `frames` consumed over `usecs`. Returns the new estimate when
    /// a window completes.
    pub fn observe(&mut self, frames: u64, usecs: u64) -> Option<u32> {
        self.frames += frames;
        self.usecs += usecs;
        if self.usecs < WINDOW_US {
            return None;
        }

        let measured = (self.frames * 1_000_000 / self.usecs) as u32;
        let next = match self.estimate {
            Some(est) => ((est as u64 * 3 + measured as u64) / 4) as u32,
            None => measured,
        };
        self.estimate = Some(next);
        self.frames = 0;
        self.usecs = 0;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_nominal_until_one_second() {
        let mut est = RateEstimator::new(48_000);
        for _ in 0..99 {
            assert_eq!(est.observe(470, 10_000), None);
        }
        assert_eq!(est.rate(), 48_000);
        assert!(!est.is_settled());

        assert_eq!(est.observe(470, 10_000), Some(47_000));
        assert_eq!(est.rate(), 47_000);
    }

    #[test]
    fn later_windows_are_smoothed() {
        let mut est = RateEstimator::new(48_000);
        est.observe(48_000, 1_000_000);
        assert_eq!(est.observe(44_000, 1_000_000), Some(47_000));
        assert_eq!(est.observe(47_000, 1_000_000), Some(47_000));
    }

    #[test]
    fn converges_on_steady_rate() {
        let mut est = RateEstimator::new(48_000);
        est.observe(47_000, 1_000_000);
        for _ in 0..40 {
            est.observe(48_120, 1_000_000);
        }
        assert!((est.rate() as i64 - 48_120).abs() <= 3);
    }
}

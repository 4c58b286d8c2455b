//! Frame period rescaled to the audio clock.

use crate::clock::Usec;

/// Nominal video frame period: 16743 µs less a 1/1024 correction.
pub const NOMINAL_FRAME_PERIOD_US: Usec = 16_743 - 16_743 / 1_024;

/// Frame period that keeps video in step with the audio device.
///
/// `output_rate` is the rate the stream was opened at, `reported_rate`
/// the rate the device is actually consuming. A device running slow
/// stretches the period, a fast one shrinks it. An unknown (zero)
/// reported rate gives the nominal period.
pub fn frame_period(output_rate: u32, reported_rate: u32) -> Usec {
    if reported_rate == 0 {
        return NOMINAL_FRAME_PERIOD_US;
    }
    NOMINAL_FRAME_PERIOD_US * output_rate as Usec / reported_rate as Usec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_period_applies_1024th_correction() {
        assert_eq!(NOMINAL_FRAME_PERIOD_US, 16_727);
        let hz = 1e6 / NOMINAL_FRAME_PERIOD_US as f64;
        assert!((hz - 59.78).abs() < 0.01);
    }

    #[test]
    fn matching_rates_give_nominal_period() {
        assert_eq!(frame_period(48_000, 48_000), NOMINAL_FRAME_PERIOD_US);
    }

    #[test]
    fn slow_device_stretches_period() {
        assert!(frame_period(48_000, 47_900) > NOMINAL_FRAME_PERIOD_US);
        assert!(frame_period(48_000, 48_100) < NOMINAL_FRAME_PERIOD_US);
        assert_eq!(frame_period(48_000, 24_000), 2 * NOMINAL_FRAME_PERIOD_US);
    }

    #[test]
    fn unknown_rate_falls_back_to_nominal() {
        assert_eq!(frame_period(48_000, 0), NOMINAL_FRAME_PERIOD_US);
    }
}

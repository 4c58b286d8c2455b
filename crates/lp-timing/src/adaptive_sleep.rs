//! Deadline sleep that compensates for scheduler oversleep.

use crate::clock::{Clock, Usec};

/// Consecutive calls without room to sleep before the estimates reset.
const IDLE_RESET: u32 = 60;

/// Sleeps until a deadline, finishing the last stretch by spinning.
///
/// The OS usually wakes a sleeping thread late. `AdaptiveSleep` tracks
/// the mean oversleep and its mean deviation (exponential averages with
/// weight 1/16) and stops sleeping that much early, then spins on the
/// clock for the remainder.
#[derive(Debug)]
pub struct AdaptiveSleep<C> {
    clock: C,
    oversleep: Usec,
    oversleep_var: Usec,
    idle_calls: u32,
}

impl<C: Clock> AdaptiveSleep<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            oversleep: 0,
            oversleep_var: 0,
            idle_calls: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current oversleep estimate (mean, deviation).
    pub fn oversleep_estimate(&self) -> (Usec, Usec) {
        (self.oversleep, self.oversleep_var)
    }

    /// Block until `base + duration` and return the time actually elapsed
    /// since `base`.
    ///
    /// Returns immediately when the deadline has already passed. The
    /// result is never less than `duration` and is not clamped to it.
    pub fn sleep_until(&mut self, base: Usec, duration: Usec) -> Usec {
        let mut now = self.clock.now();
        let elapsed = now.saturating_sub(base);
        if elapsed >= duration {
            return elapsed;
        }

        let remaining = duration - elapsed;
        let margin = self.oversleep + self.oversleep_var;

        if remaining > margin {
            let nap = remaining - margin;
            let wake_target = now + nap;
            self.clock.sleep(nap);
            now = self.clock.now();

            // Early wakeups count as zero oversleep.
            let measured = now.saturating_sub(wake_target);
            self.oversleep_var =
                (self.oversleep_var * 15 + measured.abs_diff(self.oversleep) + 8) >> 4;
            self.oversleep = (self.oversleep * 15 + measured + 8) >> 4;
            self.idle_calls = 0;
        } else {
            self.idle_calls += 1;
            if self.idle_calls >= IDLE_RESET {
                self.idle_calls = 0;
                self.oversleep = 0;
                self.oversleep_var = 0;
            }
        }

        while now.saturating_sub(base) < duration {
            self.clock.spin();
            now = self.clock.now();
        }

        now - base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;

    #[test]
    fn exact_clock_elapses_exactly() {
        let mut sleep = AdaptiveSleep::new(VirtualClock::new());
        assert_eq!(sleep.sleep_until(0, 1_000), 1_000);
        assert_eq!(sleep.clock().now(), 1_000);
    }

    #[test]
    fn past_deadline_returns_immediately() {
        let clock = VirtualClock::new();
        clock.advance(5_000);
        let mut sleep = AdaptiveSleep::new(&clock);
        assert_eq!(sleep.sleep_until(1_000, 1_000), 4_000);
        assert_eq!(clock.now(), 5_000);
    }

    #[test]
    fn learns_constant_oversleep() {
        let clock = VirtualClock::with_oversleep(200);
        let mut sleep = AdaptiveSleep::new(&clock);

        let mut base = 0;
        for _ in 0..200 {
            let elapsed = sleep.sleep_until(base, 16_000);
            assert!(elapsed >= 16_000);
            assert!(elapsed <= 16_000 + 200);
            base += elapsed;
        }

        let (mean, _) = sleep.oversleep_estimate();
        assert!((190..=210).contains(&mean), "estimate {}", mean);
        // Once learned, the deadline is hit without overshoot.
        assert_eq!(sleep.sleep_until(base, 16_000), 16_000);
    }

    #[test]
    fn estimates_reset_after_idle_calls() {
        let clock = VirtualClock::with_oversleep(500);
        let mut sleep = AdaptiveSleep::new(&clock);
        for i in 0..50 {
            sleep.sleep_until(i * 20_000, 20_000);
        }
        assert!(sleep.oversleep_estimate().0 > 0);

        // Deadlines closer than the margin: spin only, never sleep.
        for _ in 0..IDLE_RESET {
            let now = clock.now();
            assert_eq!(sleep.sleep_until(now, 1), 1);
        }
        assert_eq!(sleep.oversleep_estimate(), (0, 0));
    }
}

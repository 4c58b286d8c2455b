//! Presentation timeline.

use crate::adaptive_sleep::AdaptiveSleep;
use crate::clock::{Clock, Usec};

/// Paces presented frames one frame period apart.
///
/// `last` is the time the previous wait returned. Each wait sleeps until
/// `last + frame_time`; a late wakeup moves `last` to the actual wake
/// time, so the lateness delays only the following frame and never
/// accumulates across frames.
#[derive(Debug)]
pub struct FrameWait<C> {
    sleep: AdaptiveSleep<C>,
    last: Usec,
}

impl<C: Clock> FrameWait<C> {
    pub fn new(clock: C) -> Self {
        Self {
            sleep: AdaptiveSleep::new(clock),
            last: 0,
        }
    }

    pub fn clock(&self) -> &C {
        self.sleep.clock()
    }

    /// Timeline position: when the previous wait completed.
    pub fn last(&self) -> Usec {
        self.last
    }

    /// Block until one `frame_time` after the previous frame. Returns how
    /// late the wakeup was.
    pub fn wait_for_next_frame_time(&mut self, frame_time: Usec) -> Usec {
        let elapsed = self.sleep.sleep_until(self.last, frame_time);
        let late = elapsed - frame_time;
        self.last += late;
        self.last += frame_time;
        late
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;

    const FT: Usec = 16_727;

    #[test]
    fn exact_clock_keeps_nominal_cadence() {
        let mut wait = FrameWait::new(VirtualClock::new());
        for n in 1..=10 {
            assert_eq!(wait.wait_for_next_frame_time(FT), 0);
            assert_eq!(wait.last(), n * FT);
        }
    }

    #[test]
    fn constant_oversleep_does_not_compound() {
        let delta = 750;
        let clock = VirtualClock::with_oversleep(delta);
        let mut wait = FrameWait::new(&clock);

        for frames in 1..=1_000u64 {
            let late = wait.wait_for_next_frame_time(FT);
            assert!(late <= delta);
            // The timeline tracks the actual wake time...
            assert_eq!(wait.last(), clock.now());
            // ...and each frame took at most one period plus one oversleep.
            assert!(clock.now() <= frames * (FT + delta));
        }
    }

    #[test]
    fn single_stall_delays_one_frame() {
        let clock = VirtualClock::new();
        let mut wait = FrameWait::new(&clock);
        wait.wait_for_next_frame_time(FT);

        // A 40 ms hiccup while producing the next frame.
        clock.advance(40_000);
        let late = wait.wait_for_next_frame_time(FT);
        assert_eq!(late, 40_000 - FT);
        let after_stall = clock.now();

        // Following frames are paced from the stall, with no catch-up burst.
        assert_eq!(wait.wait_for_next_frame_time(FT), 0);
        assert_eq!(clock.now(), after_stall + FT);
    }

    #[test]
    fn work_between_waits_is_absorbed() {
        let clock = VirtualClock::new();
        let mut wait = FrameWait::new(&clock);
        for _ in 0..20 {
            clock.advance(5_000);
            assert_eq!(wait.wait_for_next_frame_time(FT), 0);
        }
        assert_eq!(clock.now(), 20 * FT);
    }
}

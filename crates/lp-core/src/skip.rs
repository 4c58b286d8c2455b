//! Frame-skip policy driven by the audio low-buffer flag.

use heapless::HistoryBuffer;

/// Number of recent low-buffer readings the scheduler looks at.
pub const SKIP_WINDOW: usize = 4;

/// Decides whether the next completed video frame is presented.
///
/// Skipping only happens while the audio path reports a low buffer:
/// - the current reading must be low (a healthy reading never skips),
/// - the last `quorum` readings must all be low, so isolated or
///   alternating low readings never start a run,
/// - at most `max_run` frames are skipped in a row before one is
///   presented regardless.
#[derive(Clone, Debug)]
pub struct SkipSched {
    window: HistoryBuffer<bool, SKIP_WINDOW>,
    quorum: usize,
    max_run: u32,
    run: u32,
}

impl SkipSched {
    pub const DEFAULT_QUORUM: usize = 2;
    pub const DEFAULT_MAX_RUN: u32 = 4;

    /// # Panics
    ///
    /// If `quorum` is zero or larger than [`SKIP_WINDOW`], or `max_run` is zero.
    pub fn new(quorum: usize, max_run: u32) -> Self {
        assert!(
            (1..=SKIP_WINDOW).contains(&quorum),
            "skip quorum must be within 1..={}",
            SKIP_WINDOW
        );
        assert!(max_run > 0, "skip max_run must be positive");
        Self {
            window: HistoryBuffer::new(),
            quorum,
            max_run,
            run: 0,
        }
    }

    /// Record the latest low-buffer reading and decide whether to skip
    /// the frame about to be presented.
    pub fn skip_next(&mut self, buffer_low: bool) -> bool {
        self.window.write(buffer_low);

        if !buffer_low {
            self.run = 0;
            return false;
        }

        if self.run >= self.max_run {
            self.run = 0;
            return false;
        }

        if !self.sustained() {
            return false;
        }

        self.run += 1;
        true
    }

    fn sustained(&self) -> bool {
        let seen = self.window.len();
        seen >= self.quorum
            && self
                .window
                .oldest_ordered()
                .skip(seen - self.quorum)
                .all(|&low| low)
    }

    /// Frames skipped in the current run.
    pub fn run_length(&self) -> u32 {
        self.run
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.run = 0;
    }
}

impl Default for SkipSched {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUORUM, Self::DEFAULT_MAX_RUN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_buffer_never_skips() {
        let mut sched = SkipSched::default();
        for _ in 0..100 {
            assert!(!sched.skip_next(false));
        }
    }

    #[test]
    fn constant_low_still_presents_some_frames() {
        let mut sched = SkipSched::default();
        let calls = 1_000;
        let skipped = (0..calls).filter(|_| sched.skip_next(true)).count();
        assert!(skipped > 0);
        // One frame in every max_run + 1 is presented.
        assert!(calls - skipped >= calls / (SkipSched::DEFAULT_MAX_RUN as usize + 1));
    }

    #[test]
    fn isolated_low_reading_does_not_skip() {
        let mut sched = SkipSched::default();
        for _ in 0..10 {
            sched.skip_next(false);
        }
        assert!(!sched.skip_next(true));
        assert!(!sched.skip_next(false));
    }

    #[test]
    fn alternating_readings_do_not_flap() {
        let mut sched = SkipSched::default();
        let decisions: Vec<bool> = (0..12).map(|i| sched.skip_next(i % 2 == 0)).collect();
        let flips = decisions.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(flips < decisions.len() - 2, "decisions: {:?}", decisions);
        assert!(decisions.iter().all(|&skip| !skip));
    }

    #[test]
    fn low_after_healthy_needs_fresh_quorum() {
        let mut sched = SkipSched::default();
        assert!(!sched.skip_next(true));
        assert!(sched.skip_next(true));
        assert!(!sched.skip_next(false));
        assert!(!sched.skip_next(true));
        assert!(sched.skip_next(true));
    }

    #[test]
    fn sustained_low_starts_skipping() {
        let mut sched = SkipSched::default();
        assert!(!sched.skip_next(true));
        assert!(sched.skip_next(true));
        assert_eq!(sched.run_length(), 1);
    }

    #[test]
    fn run_is_capped_then_presents() {
        let mut sched = SkipSched::new(1, 2);
        assert!(sched.skip_next(true));
        assert!(sched.skip_next(true));
        assert!(!sched.skip_next(true));
        assert!(sched.skip_next(true));
    }

    #[test]
    fn healthy_reading_ends_run() {
        let mut sched = SkipSched::new(1, 8);
        assert!(sched.skip_next(true));
        assert!(sched.skip_next(true));
        assert!(!sched.skip_next(false));
        assert_eq!(sched.run_length(), 0);
    }

    #[test]
    fn reset_forgets_history() {
        let mut sched = SkipSched::default();
        sched.skip_next(true);
        sched.reset();
        assert!(!sched.skip_next(true));
    }

    #[test]
    #[should_panic(expected = "quorum")]
    fn quorum_larger_than_window_is_rejected() {
        SkipSched::new(SKIP_WINDOW + 1, 4);
    }
}

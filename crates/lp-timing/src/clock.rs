//! Monotonic time sources.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Microseconds on a monotonic timeline.
pub type Usec = u64;

/// A monotonic clock that can also block the caller.
pub trait Clock {
    /// Microseconds since the clock's origin. Never goes backwards.
    fn now(&self) -> Usec;

    /// Block for roughly `usecs`. May oversleep.
    fn sleep(&self, usecs: Usec);

    /// Give up the CPU briefly while busy-waiting for a deadline.
    fn spin(&self) {
        std::thread::yield_now();
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Usec {
        (**self).now()
    }

    fn sleep(&self, usecs: Usec) {
        (**self).sleep(usecs)
    }

    fn spin(&self) {
        (**self).spin()
    }
}

/// Wall-clock-independent system time, measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Usec {
        self.origin.elapsed().as_micros() as Usec
    }

    fn sleep(&self, usecs: Usec) {
        std::thread::sleep(Duration::from_micros(usecs));
    }
}

/// Deterministic clock for offline rendering and tests.
///
/// `sleep` advances time instantly by the requested amount plus a fixed
/// `oversleep`; `spin` advances by `spin_step`.
#[derive(Debug)]
pub struct VirtualClock {
    now: Cell<Usec>,
    oversleep: Usec,
    spin_step: Usec,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::with_oversleep(0)
    }

    pub fn with_oversleep(oversleep: Usec) -> Self {
        Self {
            now: Cell::new(0),
            oversleep,
            spin_step: 1,
        }
    }

    /// Move time forward without sleeping, e.g. to model work done
    /// between waits.
    pub fn advance(&self, usecs: Usec) {
        self.now.set(self.now.get() + usecs);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Usec {
        self.now.get()
    }

    fn sleep(&self, usecs: Usec) {
        self.advance(usecs + self.oversleep);
    }

    fn spin(&self) {
        self.advance(self.spin_step);
    }
}

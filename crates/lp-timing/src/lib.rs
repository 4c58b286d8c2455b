//! Frame pacing on a monotonic clock.
//!
//! [`FrameWait`] keeps the presentation timeline; [`AdaptiveSleep`] does
//! the blocking and learns how much the OS oversleeps. Both are generic
//! over [`Clock`] so tests run on a [`VirtualClock`] instead of real time.

mod adaptive_sleep;
mod clock;
mod frame_wait;
mod period;

pub use adaptive_sleep::AdaptiveSleep;
pub use clock::{Clock, SystemClock, Usec, VirtualClock};
pub use frame_wait::FrameWait;
pub use period::{frame_period, NOMINAL_FRAME_PERIOD_US};

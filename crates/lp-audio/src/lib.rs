//! Audio output path for linkpace.
//!
//! [`AudioOut`] resamples nominal-rate frames to the device rate, writes
//! them to an [`AudioSink`] and reports whether the device buffer is
//! running low.

mod audio_out;
mod cpal_backend;
mod rate_est;
mod resampler;
mod traits;

pub use audio_out::{is_low, AudioOut, AudioStatus};
pub use cpal_backend::{output_device_names, CpalSink};
pub use rate_est::RateEstimator;
pub use resampler::{LinearFactory, LinearResampler, Resampler, ResamplerFactory};
pub use traits::{AudioError, AudioSink, SinkStatus};

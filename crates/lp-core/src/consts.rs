//! Fixed rates and sizes of the emulated machine.

/// Rate at which the emulation core produces stereo frames (Hz).
pub const NOMINAL_SAMPLE_RATE: u32 = 2_097_152;

/// Nominal number of sample frames per video frame (~59.73 Hz).
pub const SAMPLES_PER_FRAME: usize = 35_112;

/// Largest number of frames a single emulation step may produce past
/// the amount it was asked for.
pub const MAX_OVERPRODUCTION: usize = 2_064;

/// Largest batch handed to the audio path in one write.
pub const MAX_BATCH: usize = SAMPLES_PER_FRAME + MAX_OVERPRODUCTION;

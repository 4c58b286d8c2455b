//! Sample accounting and frame-skip policy for linkpace.
//!
//! Defines the collaborator contracts the frame loop drives (emulation
//! core, input source, video sink) and the pure pieces of the loop that
//! need no clock or device: the sample ring, the skip scheduler and the
//! MIDI clock to link-cable translation.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod consts;
mod frame;
pub mod input;
pub mod midi;
mod ring;
mod skip;
mod step;
mod video;

pub use consts::{MAX_BATCH, MAX_OVERPRODUCTION, NOMINAL_SAMPLE_RATE, SAMPLES_PER_FRAME};
pub use frame::Frame;
pub use input::{Button, ButtonMask, HostKey, InputSource, KeyboardState};
pub use midi::{LinkAction, LinkSync, MidiMessage};
pub use ring::{Batch, SampleRing};
pub use skip::{SkipSched, SKIP_WINDOW};
pub use step::{EmulationCore, StepResult};
pub use video::{NullVideo, VideoFrame, VideoSink, VIDEO_HEIGHT, VIDEO_WIDTH};

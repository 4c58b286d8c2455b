//! Collaborators the frame loop drives, owned by whoever starts it.

use lp_audio::{AudioOut, AudioSink, Resampler};
use lp_core::{EmulationCore, VideoSink};

use crate::midi::MidiReceiver;

/// The emulation core, audio path, video sink and optional MIDI input
/// for one session. Passed by reference into
/// [`FrameLoop`](crate::FrameLoop) on every iteration.
pub struct Runtime<C, R, S, V> {
    pub core: C,
    pub audio: AudioOut<R, S>,
    pub video: V,
    pub midi: Option<MidiReceiver>,
}

impl<C, R, S, V> Runtime<C, R, S, V>
where
    C: EmulationCore,
    R: Resampler,
    S: AudioSink,
    V: VideoSink,
{
    pub fn new(core: C, audio: AudioOut<R, S>, video: V) -> Self {
        Self {
            core,
            audio,
            video,
            midi: None,
        }
    }

    pub fn with_midi(mut self, midi: MidiReceiver) -> Self {
        self.midi = Some(midi);
        self
    }
}

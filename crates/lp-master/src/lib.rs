//! Headless controller for linkpace.
//!
//! Wires the emulation core, audio output and pacing into a
//! [`FrameLoop`], either on a real-time thread against the sound card or
//! offline on a virtual clock for rendering.

mod config;
mod error;
mod frame_loop;
mod midi;
mod midi_input;
mod runtime;
mod tone;
mod wav;

use lp_audio::{AudioOut, AudioSink, CpalSink, LinearFactory};
use lp_core::{ButtonMask, HostKey, InputSource, KeyboardState, NullVideo, MAX_BATCH};
use lp_timing::{SystemClock, VirtualClock};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

pub use config::{AudioConfig, Config, MidiConfig, ResamplerKind, SkipConfig, TimingConfig};
pub use error::{ConfigError, Error, MidiError, Result};
pub use frame_loop::{FrameLoop, FrameOutcome, Iteration, LoopStats, SharedStats};
pub use midi::{midi_channel, MidiReceiver, MidiSender};
pub use midi_input::{midi_input_names, select_port, MidiInputLink, MidiPort, PREFERRED_PORT};
pub use runtime::Runtime;
pub use tone::{ToneCore, BURST};
pub use wav::{frames_to_wav, write_wav, CaptureSink};

// Re-export common types so callers don't need lp-core directly.
pub use lp_core::{Frame, MidiMessage};

/// Joypad state shared between the front end and the playback thread.
#[derive(Clone, Debug, Default)]
pub struct SharedInput(Arc<AtomicU8>);

impl SharedInput {
    pub fn set(&self, mask: ButtonMask) {
        self.0.store(mask.bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> ButtonMask {
        ButtonMask::from_bits(self.0.load(Ordering::Relaxed))
    }
}

impl InputSource for SharedInput {
    fn poll(&mut self) -> ButtonMask {
        self.get()
    }
}

/// Owns the configuration and manages playback.
pub struct Controller {
    config: Config,
    keyboard: KeyboardState,
    input: SharedInput,
    midi_sender: Option<MidiSender>,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    stats: Arc<SharedStats>,
    finished: Arc<AtomicBool>,
    output_rate: u32,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            keyboard: KeyboardState::new(),
            input: SharedInput::default(),
            midi_sender: None,
            playback: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // --- Input ---

    /// Forward a host key event to the joypad.
    pub fn handle_key(&mut self, key: HostKey, down: bool) {
        self.keyboard.handle_key(key, down);
        self.input.set(self.keyboard.mask());
    }

    pub fn buttons(&self) -> ButtonMask {
        self.input.get()
    }

    // --- Real-time playback ---

    /// Open the audio device and start the frame loop on its own thread.
    ///
    /// Returns once the device is open, or with the error that prevented
    /// opening it.
    pub fn play(&mut self) -> Result<()> {
        self.stop();
        self.config.validate()?;

        let (midi_tx, midi_rx) = midi_channel(self.config.midi.queue_capacity);
        let (ready_tx, ready_rx) = mpsc::channel();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(SharedStats::default());
        let finished = Arc::new(AtomicBool::new(false));

        let config = self.config.clone();
        let input = self.input.clone();
        let stop = stop_signal.clone();
        let shared = stats.clone();
        let done = finished.clone();

        let thread = std::thread::Builder::new()
            .name("linkpace-loop".into())
            .spawn(move || {
                playback_thread(config, input, midi_rx, stop, shared, done, ready_tx);
            })?;

        let output_rate = match ready_rx.recv() {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e.into());
            }
            Err(_) => {
                let _ = thread.join();
                return Err(Error::ThreadExited);
            }
        };

        self.midi_sender = Some(midi_tx);
        self.playback = Some(PlaybackHandle {
            stop_signal,
            stats,
            finished,
            output_rate,
            thread: Some(thread),
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        self.midi_sender = None;
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    /// Loop totals of the current playback, if any.
    pub fn stats(&self) -> Option<LoopStats> {
        self.playback.as_ref().map(|p| p.stats.snapshot())
    }

    /// Rate the device was opened at.
    pub fn output_rate(&self) -> Option<u32> {
        self.playback.as_ref().map(|p| p.output_rate)
    }

    /// Hand out the MIDI input end for the current playback. The frame
    /// loop drains it once per iteration.
    pub fn take_midi_sender(&mut self) -> Option<MidiSender> {
        self.midi_sender.take()
    }

    // --- Offline rendering ---

    /// Run the loop for `frames` video frames on a virtual clock and
    /// return the device-rate audio it wrote.
    pub fn render_frames(&self, frames: u64) -> Vec<Frame> {
        let rate = self.config.audio.rate;
        let per_frame = (lp_core::SAMPLES_PER_FRAME as u64 * rate as u64
            / lp_core::NOMINAL_SAMPLE_RATE as u64) as usize
            + 1;
        let sink = CaptureSink::with_capacity(rate, per_frame * frames as usize);
        let audio = match self.config.audio.resampler {
            ResamplerKind::Linear => AudioOut::new(&LinearFactory, sink, MAX_BATCH),
        };
        let mut rt = Runtime::new(ToneCore::new(self.input.clone()), audio, NullVideo);

        let mut frame_loop = FrameLoop::from_config(VirtualClock::new(), rate, &self.config);
        frame_loop.run_frames(&mut rt, frames);
        rt.audio.into_sink().into_frames()
    }

    pub fn render_to_wav(&self, frames: u64) -> Vec<u8> {
        frames_to_wav(&self.render_frames(frames), self.config.audio.rate)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn playback_thread(
    config: Config,
    input: SharedInput,
    midi: MidiReceiver,
    stop_signal: Arc<AtomicBool>,
    stats: Arc<SharedStats>,
    finished: Arc<AtomicBool>,
    ready: mpsc::Sender<std::result::Result<u32, lp_audio::AudioError>>,
) {
    let audio_cfg = &config.audio;
    let sink = match CpalSink::open(audio_cfg.rate, audio_cfg.latency_ms, audio_cfg.periods) {
        Ok(sink) => sink,
        Err(e) => {
            error!("cannot open audio output: {}", e);
            finished.store(true, Ordering::Relaxed);
            let _ = ready.send(Err(e));
            return;
        }
    };
    let output_rate = sink.rate();
    let _ = ready.send(Ok(output_rate));

    let audio = match audio_cfg.resampler {
        ResamplerKind::Linear => AudioOut::new(&LinearFactory, sink, MAX_BATCH),
    };
    let mut rt = Runtime::new(ToneCore::new(input), audio, NullVideo).with_midi(midi);
    let mut frame_loop = FrameLoop::from_config(SystemClock::new(), output_rate, &config);

    let totals = frame_loop.run(&mut rt, &stop_signal, &stats);
    info!(
        underruns = rt.audio.sink().underruns(),
        overflows = rt.audio.sink().overflows(),
        frames = totals.frames(),
        "playback finished"
    );
    finished.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_update_shared_buttons() {
        let mut ctl = Controller::default();
        ctl.handle_key(HostKey::Delete, true);
        assert_eq!(ctl.buttons().count(), 2);
        ctl.handle_key(HostKey::D, false);
        assert_eq!(ctl.buttons().count(), 1);
    }

    #[test]
    fn idle_controller_reports_nothing() {
        let mut ctl = Controller::default();
        assert!(!ctl.is_playing());
        assert!(ctl.stats().is_none());
        assert!(ctl.take_midi_sender().is_none());
    }

    #[test]
    fn render_length_tracks_output_rate() {
        let ctl = Controller::default();
        let frames = ctl.render_frames(60);
        // 60 frames of 35112 samples at 2097152 Hz is about 1.0046 s.
        let expected = 60.0 * 35_112.0 * 48_000.0 / 2_097_152.0;
        assert!((frames.len() as f64 - expected).abs() <= 1.0);
        assert!(frames.iter().any(|f| f.left != 0));
    }
}

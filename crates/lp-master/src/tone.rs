//! Test-tone emulation core.
//!
//! Stands in for a real machine: it produces audio at the nominal rate in
//! fixed bursts, so like real hardware it overshoots the requested count
//! and crosses video-frame boundaries mid-burst.

use lp_core::midi::{LINK_DISABLE, LINK_ENABLE, LINK_SHIFT_IN};
use lp_core::{
    ButtonMask, EmulationCore, Frame, InputSource, StepResult, VideoFrame, MAX_OVERPRODUCTION,
    NOMINAL_SAMPLE_RATE, SAMPLES_PER_FRAME,
};

/// Frames produced per burst.
pub const BURST: usize = MAX_OVERPRODUCTION;

const AMPLITUDE: i16 = 6_000;
const BASE_HZ: u32 = 220;

/// Square-wave generator whose pitch follows the joypad.
///
/// With no buttons held the tone is 220 Hz; every held button adds
/// another 220 Hz. The input source is polled once per step.
pub struct ToneCore<I> {
    input: I,
    buttons: ButtonMask,
    /// Position within the current video frame, in samples.
    frame_pos: usize,
    /// Position within the current square-wave period, in samples.
    phase: u32,
    frames: u64,
    link_enabled: bool,
    link_shifts: u64,
}

impl<I: InputSource> ToneCore<I> {
    pub fn new(input: I) -> Self {
        Self {
            input,
            buttons: ButtonMask::NONE,
            frame_pos: 0,
            phase: 0,
            frames: 0,
            link_enabled: false,
            link_shifts: 0,
        }
    }

    /// Video frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    pub fn link_enabled(&self) -> bool {
        self.link_enabled
    }

    /// Shift-in pulses received while the link was enabled.
    pub fn link_shifts(&self) -> u64 {
        self.link_shifts
    }

    /// Samples per square-wave period at the current pitch.
    pub fn period(&self) -> u32 {
        NOMINAL_SAMPLE_RATE / (BASE_HZ * (self.buttons.count() + 1))
    }

    fn fill(&mut self, out: &mut [Frame]) {
        let period = self.period();
        let half = period / 2;
        for frame in out {
            let level = if self.phase < half { AMPLITUDE } else { -AMPLITUDE };
            *frame = Frame::mono(level);
            self.phase += 1;
            if self.phase >= period {
                self.phase = 0;
            }
        }
    }

    fn draw(&self, video: &mut VideoFrame) {
        let shift = self.frames as usize;
        let tint = if self.link_enabled { 0x0000_40ff } else { 0x0040_4000 };
        for y in 0..video.height() {
            let row = video.row_mut(y);
            for (x, px) in row.iter_mut().enumerate() {
                let band = ((x + shift) / 8 + y / 8) % 4;
                *px = 0xff00_0000 | (band as u32 * 0x0030_3030) | tint;
            }
        }
    }
}

impl<I: InputSource> EmulationCore for ToneCore<I> {
    fn run_for(
        &mut self,
        video: &mut VideoFrame,
        audio: &mut [Frame],
        requested: usize,
    ) -> StepResult {
        self.buttons = self.input.poll();

        let mut produced = 0;
        while produced < requested {
            let burst = BURST.min(audio.len() - produced);
            let until_boundary = SAMPLES_PER_FRAME - self.frame_pos;
            self.fill(&mut audio[produced..produced + burst]);

            if burst >= until_boundary {
                let offset = produced + until_boundary;
                produced += burst;
                self.frame_pos = burst - until_boundary;
                self.draw(video);
                self.frames += 1;
                return StepResult::FrameDone { produced, offset };
            }

            self.frame_pos += burst;
            produced += burst;
        }

        StepResult::Ran { produced }
    }

    fn link_status(&mut self, status: u16) {
        match status {
            LINK_ENABLE => self.link_enabled = true,
            LINK_DISABLE => self.link_enabled = false,
            LINK_SHIFT_IN if self.link_enabled => self.link_shifts += 1,
            _ => {}
        }
    }
}

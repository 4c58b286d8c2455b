//! MIDI transport messages to serial link translation.
//!
//! A MIDI clock master drives the emulated link port: Start enables the
//! link, Stop disables it, and every clock pulse while running shifts a
//! burst of external clock ticks into the port.

use crate::step::EmulationCore;

/// Link status that connects the external clock.
pub const LINK_ENABLE: u16 = 264;
/// Link status that disconnects the external clock.
pub const LINK_DISABLE: u16 = 265;
/// Link status for one shifted-in external clock bit.
pub const LINK_SHIFT_IN: u16 = 0xff;
/// Shift-ins sent per MIDI clock pulse.
pub const DEFAULT_TICKS_PER_CLOCK: u8 = 8;

/// System real-time messages the link sync cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    Clock,
    Start,
    Continue,
    Stop,
}

impl MidiMessage {
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            0xf8 => Some(MidiMessage::Clock),
            0xfa => Some(MidiMessage::Start),
            0xfb => Some(MidiMessage::Continue),
            0xfc => Some(MidiMessage::Stop),
            _ => None,
        }
    }

    pub fn status(self) -> u8 {
        match self {
            MidiMessage::Clock => 0xf8,
            MidiMessage::Start => 0xfa,
            MidiMessage::Continue => 0xfb,
            MidiMessage::Stop => 0xfc,
        }
    }
}

/// What [`LinkSync::handle`] did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkAction {
    Enabled,
    Disabled,
    Ticked(u8),
    Ignored,
}

/// Tracks whether the external clock is running.
#[derive(Clone, Debug)]
pub struct LinkSync {
    running: bool,
    ticks_per_clock: u8,
}

impl LinkSync {
    pub fn new(ticks_per_clock: u8) -> Self {
        Self {
            running: false,
            ticks_per_clock,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle<C>(&mut self, message: MidiMessage, core: &mut C) -> LinkAction
    where
        C: EmulationCore + ?Sized,
    {
        match message {
            MidiMessage::Start => {
                self.running = true;
                core.link_status(LINK_ENABLE);
                LinkAction::Enabled
            }
            MidiMessage::Stop => {
                self.running = false;
                core.link_status(LINK_DISABLE);
                LinkAction::Disabled
            }
            MidiMessage::Clock if self.running => {
                for _ in 0..self.ticks_per_clock {
                    core.link_status(LINK_SHIFT_IN);
                }
                LinkAction::Ticked(self.ticks_per_clock)
            }
            MidiMessage::Clock | MidiMessage::Continue => LinkAction::Ignored,
        }
    }
}

impl Default for LinkSync {
    fn default() -> Self {
        Self::new(DEFAULT_TICKS_PER_CLOCK)
    }
}

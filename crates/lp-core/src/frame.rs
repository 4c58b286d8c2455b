//! Audio frame type.

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: i16) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Unpack a frame stored as one 32-bit word, left channel in the low half.
    ///
    /// This is the layout cores that write into `u32` sample buffers use.
    pub const fn from_packed(word: u32) -> Self {
        Self {
            left: word as u16 as i16,
            right: (word >> 16) as u16 as i16,
        }
    }

    /// Pack into one 32-bit word, left channel in the low half.
    pub const fn to_packed(self) -> u32 {
        (self.left as u16 as u32) | ((self.right as u16 as u32) << 16)
    }
}

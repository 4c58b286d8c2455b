//! Joypad state and host keyboard mapping.
//!
//! The emulation core receives an [`InputSource`] at construction and
//! polls it once per step.

/// Joypad buttons, in bit order of [`ButtonMask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Right = 4,
    Left = 5,
    Up = 6,
    Down = 7,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
    ];

    pub const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Packed set of pressed buttons, one bit per [`Button`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const NONE: ButtonMask = ButtonMask(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Pack a per-button pressed table indexed by `Button as usize`.
    pub fn from_pressed(pressed: &[bool; 8]) -> Self {
        let bits = pressed
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &down)| acc | ((down as u8) << i));
        Self(bits)
    }

    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | button.bit())
    }

    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Supplies the current joypad state on demand.
pub trait InputSource {
    fn poll(&mut self) -> ButtonMask;
}

impl<F> InputSource for F
where
    F: FnMut() -> ButtonMask,
{
    fn poll(&mut self) -> ButtonMask {
        self()
    }
}

/// Host keys the front end forwards. Everything else maps to `Other`.
///
/// The headless binary has no window to receive key events, so these only
/// arrive through `Controller::handle_key` from an embedding front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostKey {
    Up,
    Down,
    Left,
    Right,
    Z,
    X,
    S,
    D,
    LShift,
    Space,
    Delete,
    Other,
}

/// Buttons driven by a host key.
pub fn buttons_for_key(key: HostKey) -> &'static [Button] {
    match key {
        HostKey::Up => &[Button::Up],
        HostKey::Down => &[Button::Down],
        HostKey::Left => &[Button::Left],
        HostKey::Right => &[Button::Right],
        HostKey::Z | HostKey::LShift => &[Button::Select],
        HostKey::X | HostKey::Space => &[Button::Start],
        HostKey::S => &[Button::B],
        HostKey::D => &[Button::A],
        HostKey::Delete => &[Button::A, Button::B],
        HostKey::Other => &[],
    }
}

/// Keyboard-driven joypad, updated from key up/down events.
///
/// Fed by whatever owns the host window; the CLI itself never presses keys.
#[derive(Clone, Debug, Default)]
pub struct KeyboardState {
    pressed: [bool; 8],
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: HostKey, down: bool) {
        for &button in buttons_for_key(key) {
            self.pressed[button as usize] = down;
        }
    }

    pub fn release_all(&mut self) {
        self.pressed = [false; 8];
    }

    pub fn mask(&self) -> ButtonMask {
        ButtonMask::from_pressed(&self.pressed)
    }
}

impl InputSource for KeyboardState {
    fn poll(&mut self) -> ButtonMask {
        self.mask()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_follow_button_order() {
        assert_eq!(Button::A.bit(), 0x01);
        assert_eq!(Button::Start.bit(), 0x08);
        assert_eq!(Button::Right.bit(), 0x10);
        assert_eq!(Button::Down.bit(), 0x80);
    }

    #[test]
    fn pressed_table_packs_into_mask() {
        let mut pressed = [false; 8];
        pressed[Button::B as usize] = true;
        pressed[Button::Up as usize] = true;
        let mask = ButtonMask::from_pressed(&pressed);
        assert_eq!(mask.bits(), 0x42);
        assert!(mask.contains(Button::B));
        assert!(!mask.contains(Button::A));
    }

    #[test]
    fn keyboard_maps_host_keys() {
        let mut kb = KeyboardState::new();
        kb.handle_key(HostKey::D, true);
        kb.handle_key(HostKey::Space, true);
        kb.handle_key(HostKey::Other, true);
        assert_eq!(kb.poll(), ButtonMask::NONE.with(Button::A).with(Button::Start));

        kb.handle_key(HostKey::D, false);
        assert_eq!(kb.poll(), ButtonMask::NONE.with(Button::Start));
    }

    #[test]
    fn delete_presses_a_and_b() {
        let mut kb = KeyboardState::new();
        kb.handle_key(HostKey::Delete, true);
        assert_eq!(kb.mask().bits(), 0x03);
        kb.handle_key(HostKey::Delete, false);
        assert!(kb.mask().is_empty());
    }

    #[test]
    fn closures_are_input_sources() {
        let mut source = || ButtonMask::from_bits(0x10);
        assert!(source.poll().contains(Button::Right));
    }
}

//! Standard controller model.
//!
//! Button state is published by an input thread into a shared bit-vector
//! ([`ControllerState`]); the CPU samples it serially through `$4016` via the
//! strobe/shift protocol implemented by [`ControllerLatch`].

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

/// Button ordering follows the shift register bit layout (A first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    /// Single-bit mask of this button inside the state vector.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// Shared button bit-vector.
///
/// Cloning yields another handle to the same bits. Writers touch exactly one
/// bit per update so concurrent presses of different buttons never clobber
/// each other.
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    bits: Arc<AtomicU8>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a button's pressed state.
    pub fn set(&self, button: Button, pressed: bool) {
        let mask = button.mask();
        if pressed {
            self.bits.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.bits.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.bits() & button.mask() != 0
    }

    /// Samples the whole vector.
    #[inline]
    pub fn bits(&self) -> u8 {
        self.bits.load(Ordering::Acquire)
    }

    /// Releases every button.
    pub fn clear(&self) {
        self.bits.store(0, Ordering::Release);
    }
}

/// Value returned once all eight buttons have been shifted out.
const OPEN_BUS_BIT: u8 = 1;
/// Last cursor position that maps onto a button.
const LAST_BUTTON: u8 = 7;

/// Serial read-out of one controller port.
#[derive(Debug, Clone)]
pub struct ControllerLatch {
    state: ControllerState,
    strobe: bool,
    cursor: u8,
}

impl ControllerLatch {
    pub fn new(state: ControllerState) -> Self {
        Self {
            state,
            strobe: false,
            cursor: 0,
        }
    }

    /// Handles a write to the port: bit 0 is the strobe. A set strobe rewinds
    /// the cursor; a cleared one leaves it where it is.
    pub fn write(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.cursor = 0;
        }
    }

    /// Reads the next button bit.
    ///
    /// While strobed the cursor stays on button A. Once every button has been
    /// shifted out the undriven line reads as 1 until the next strobe.
    pub fn read(&mut self) -> u8 {
        if self.cursor > LAST_BUTTON {
            return OPEN_BUS_BIT;
        }
        let bit = (self.state.bits() >> self.cursor) & 0x01;
        if !self.strobe {
            self.cursor += 1;
        }
        bit
    }

    pub fn strobe(&self) -> bool {
        self.strobe
    }

    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub(crate) fn reset(&mut self) {
        self.strobe = false;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latch_with(bits: u8) -> ControllerLatch {
        let state = ControllerState::new();
        for button in Button::ALL {
            state.set(button, bits & button.mask() != 0);
        }
        ControllerLatch::new(state)
    }

    #[test]
    fn shifts_out_buttons_then_reads_open_bus() {
        let mut latch = latch_with(0b0101_0101);
        latch.write(1);
        latch.write(0);

        let reads: Vec<u8> = (0..8).map(|_| latch.read()).collect();
        assert_eq!(reads, [1, 0, 1, 0, 1, 0, 1, 0]);
        for _ in 0..4 {
            assert_eq!(latch.read(), 1);
        }
        assert_eq!(latch.cursor(), 8);

        latch.write(1);
        latch.write(0);
        assert_eq!(latch.read(), 1);
        assert_eq!(latch.read(), 0);
    }

    #[test]
    fn strobe_high_keeps_returning_button_a() {
        let mut latch = latch_with(0b0000_0010);
        latch.write(1);
        for _ in 0..10 {
            assert_eq!(latch.read(), 0);
        }
        assert_eq!(latch.cursor(), 0);

        latch.state().set(Button::A, true);
        assert_eq!(latch.read(), 1);
    }

    #[test]
    fn strobe_low_write_does_not_rewind() {
        let mut latch = latch_with(0xFF);
        latch.write(1);
        latch.write(0);
        latch.read();
        latch.read();
        latch.write(0);
        assert_eq!(latch.cursor(), 2);
    }

    #[test]
    fn single_bit_updates_leave_other_buttons_alone() {
        let state = ControllerState::new();
        state.set(Button::Start, true);
        state.set(Button::Left, true);
        state.set(Button::Start, false);
        assert_eq!(state.bits(), Button::Left.mask());
        assert!(state.is_pressed(Button::Left));
    }

    #[test]
    fn concurrent_writers_never_lose_bits() {
        let state = ControllerState::new();
        let handles: Vec<_> = Button::ALL
            .into_iter()
            .map(|button| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        state.set(button, i % 2 == 0);
                    }
                    state.set(button, true);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }
        assert_eq!(state.bits(), 0xFF);
    }
}

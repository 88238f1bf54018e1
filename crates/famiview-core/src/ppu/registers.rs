//! CPU-visible PPU register state.
//!
//! Only the registers that carry state in this model are stored: the control
//! byte, the shared address latch and the `$2007` read-ahead buffer. Mask,
//! OAMADDR and OAMDATA writes are accepted and dropped; status reads return
//! a constant.

mod addr_latch;
mod control;
mod status;

pub use addr_latch::AddrLatch;
pub use control::Control;
pub use status::Status;

/// Aggregates the state of all CPU visible PPU registers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct Registers {
    /// Mirror of the control register (`$2000`).
    pub(crate) control: Control,
    /// Current VRAM address plus write toggle (`$2006`).
    pub(crate) addr: AddrLatch,
    /// Internal buffer implementing the delayed `$2007` read behavior.
    pub(crate) read_buffer: u8,
}

impl Registers {
    /// Restores all register values to their reset defaults.
    pub(crate) fn reset(&mut self) {
        *self = Registers::default();
    }
}

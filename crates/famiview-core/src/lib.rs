//! Frame-accurate model of the console's picture processing unit.
//!
//! The crate is split the way data flows through it: [`ppu::Ppu`] owns video
//! memory and the register latches driven by the CPU, publishes a
//! [`ppu::FrameSnapshot`] once per frame period, and [`render::assemble`]
//! turns that snapshot into RGB pixels using a [`pattern::PatternTable`] and a
//! [`palette::Palette`]. Controller port 1 lives here too because the CPU
//! reaches it through the same register decoder.

pub mod controller;
pub mod error;
pub mod memory;
pub mod palette;
pub mod pattern;
pub mod ppu;
pub mod render;

pub use controller::{Button, ControllerLatch, ControllerState};
pub use error::Error;
pub use palette::{Palette, Rgb};
pub use pattern::{ChrPatternTable, PatternTable, Tile};
pub use ppu::{CpuMemory, FrameSnapshot, Interrupt, Ppu, SnapshotSink};
pub use render::{FrameBuffer, assemble};

#[cfg(test)]
mod tests {
    use ctor::ctor;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    #[ctor]
    fn init_tracing() {
        let subscriber = FmtSubscriber::builder()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::DEBUG)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
    }
}

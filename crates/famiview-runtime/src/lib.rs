//! Threads around the PPU core: the snapshot mailbox, the frame assembler,
//! input capture and the emulation driver loop.

pub mod assembler;
pub mod emulation;
mod error;
pub mod input;
pub mod mailbox;

pub use assembler::{AssemblerConfig, AssemblerHandle, DisplaySink, FrameAssembler};
pub use emulation::{Cpu, Emulation, EmulationConfig};
pub use error::RuntimeError;
pub use input::{InputCapture, InputCaptureHandle, KeyAction, KeyEvent, KeySource, Keymap};
pub use mailbox::{MailboxReceiver, MailboxSender, mailbox};

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

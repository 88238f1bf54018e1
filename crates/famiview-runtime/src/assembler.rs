//! Frame Assembler actor: renders published snapshots on its own thread.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, bounded};
use famiview_core::{Error, FrameBuffer, FrameSnapshot, Palette, PatternTable, assemble};
use tracing::{debug, error};

use crate::{RuntimeError, mailbox::MailboxReceiver};

const THREAD_NAME: &str = "frame-assembler";

/// Default pause after presenting a frame before waiting for the next one.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1);

/// Destination of finished frames.
pub trait DisplaySink: Send {
    fn present(&mut self, frame: &FrameBuffer);
}

impl<F> DisplaySink for F
where
    F: FnMut(&FrameBuffer) + Send,
{
    fn present(&mut self, frame: &FrameBuffer) {
        self(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Sleep after each presented frame. Zero disables pacing.
    pub pacing: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
        }
    }
}

pub struct FrameAssembler {
    patterns: Arc<dyn PatternTable>,
    palette: Palette,
    sink: Box<dyn DisplaySink>,
    config: AssemblerConfig,
}

impl FrameAssembler {
    pub fn new(
        patterns: Arc<dyn PatternTable>,
        palette: Palette,
        sink: impl DisplaySink + 'static,
    ) -> Self {
        Self {
            patterns,
            palette,
            sink: Box::new(sink),
            config: AssemblerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    /// Renders snapshots until the channel closes, returning the number of
    /// frames presented. Stops at the first rendering error.
    pub fn run(mut self, receiver: MailboxReceiver<Arc<FrameSnapshot>>) -> Result<u64, Error> {
        let mut presented = 0u64;
        while let Some(snapshot) = receiver.recv() {
            let frame = assemble(&snapshot, self.patterns.as_ref(), &self.palette).inspect_err(
                |err| error!(frame = snapshot.frame(), %err, "frame assembly failed"),
            )?;
            self.sink.present(&frame);
            presented += 1;

            if !self.config.pacing.is_zero() {
                thread::sleep(self.config.pacing);
            }
        }
        debug!(presented, "snapshot channel closed");
        Ok(presented)
    }

    /// Runs the assembler on a named thread. A rendering failure is reported
    /// once on [`AssemblerHandle::faults`].
    pub fn spawn(
        self,
        receiver: MailboxReceiver<Arc<FrameSnapshot>>,
    ) -> Result<AssemblerHandle, RuntimeError> {
        let (fault_tx, fault_rx) = bounded(1);
        let join = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                if let Err(err) = self.run(receiver) {
                    let _ = fault_tx.send(err);
                }
            })
            .map_err(|source| RuntimeError::Spawn {
                name: THREAD_NAME,
                source,
            })?;

        Ok(AssemblerHandle {
            faults: fault_rx,
            join,
        })
    }
}

pub struct AssemblerHandle {
    faults: Receiver<Error>,
    join: JoinHandle<()>,
}

impl AssemblerHandle {
    pub fn faults(&self) -> &Receiver<Error> {
        &self.faults
    }

    /// Non-blocking check for a rendering failure.
    pub fn try_fault(&self) -> Option<Error> {
        self.faults.try_recv().ok()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the thread to exit and returns its failure, if any.
    pub fn join(self) -> Result<(), RuntimeError> {
        if self.join.join().is_err() {
            return Err(RuntimeError::AssemblerStopped);
        }
        match self.faults.try_recv() {
            Ok(err) => Err(err.into()),
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use famiview_core::{ChrPatternTable, Ppu, memory::Register, ppu::registers::Control};

    use super::*;
    use crate::mailbox::mailbox;

    fn blank_patterns() -> Arc<dyn PatternTable> {
        Arc::new(ChrPatternTable::new(vec![0u8; 0x2000]))
    }

    fn counting_sink(counter: &Arc<AtomicU64>) -> impl DisplaySink + 'static {
        let counter = Arc::clone(counter);
        move |frame: &FrameBuffer| {
            assert_eq!(frame.as_bytes().len(), 256 * 240 * 3);
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn presents_until_channel_closes() {
        let presented = Arc::new(AtomicU64::new(0));
        let assembler = FrameAssembler::new(blank_patterns(), Palette::ntsc(), counting_sink(&presented))
            .with_config(AssemblerConfig {
                pacing: Duration::ZERO,
            });

        let (tx, rx) = mailbox();
        let ppu = Ppu::new();
        tx.publish(Arc::new(ppu.snapshot()));
        drop(tx);

        assert_eq!(assembler.run(rx), Ok(1));
        assert_eq!(presented.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spawned_assembler_reports_unsupported_sprites() {
        let presented = Arc::new(AtomicU64::new(0));
        let assembler = FrameAssembler::new(blank_patterns(), Palette::ntsc(), counting_sink(&presented));

        let (tx, rx) = mailbox();
        let handle = assembler.spawn(rx).expect("spawn assembler");

        let mut ppu = Ppu::new();
        ppu.write(Register::Control.offset(), Control::SPRITE_SIZE_16.bits())
            .expect("ctrl");
        tx.publish(Arc::new(ppu.snapshot()));

        let fault = handle
            .faults()
            .recv_timeout(Duration::from_secs(5))
            .expect("fault reported");
        assert_eq!(fault, Error::TallSpritesUnsupported);
        assert_eq!(presented.load(Ordering::SeqCst), 0);
        drop(tx);
        assert!(handle.join().is_ok(), "fault already consumed");
    }

    #[test]
    fn join_surfaces_unread_fault() {
        let assembler = FrameAssembler::new(blank_patterns(), Palette::ntsc(), |_: &FrameBuffer| {});
        let (tx, rx) = mailbox();
        let handle = assembler.spawn(rx).expect("spawn assembler");

        let mut ppu = Ppu::new();
        ppu.write(Register::Control.offset(), Control::SPRITE_SIZE_16.bits())
            .expect("ctrl");
        tx.publish(Arc::new(ppu.snapshot()));
        drop(tx);

        let err = handle.join().expect_err("fault");
        assert!(err.is_unsupported_feature());
    }
}

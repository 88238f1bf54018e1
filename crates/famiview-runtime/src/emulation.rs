//! Emulation driver: steps the CPU collaborator and the PPU in lockstep.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use famiview_core::{Error, FrameSnapshot, Ppu};
use tracing::{debug, error, info};

use crate::{
    RuntimeError,
    assembler::{AssemblerHandle, FrameAssembler},
    mailbox::mailbox,
};

/// NTSC: ~60.0988 Hz
pub const FRAME_DURATION_NTSC: Duration = Duration::from_nanos(16_639_263);

/// One step of the CPU side. Implementations issue register reads and writes
/// against the PPU; the driver ticks the PPU after every step.
pub trait Cpu {
    fn cycle(&mut self, ppu: &mut Ppu) -> Result<(), Error>;
}

impl<F> Cpu for F
where
    F: FnMut(&mut Ppu) -> Result<(), Error>,
{
    fn cycle(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        self(ppu)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulationConfig {
    /// Wall-clock time per frame period. `None` runs unthrottled.
    pub frame_duration: Option<Duration>,
    /// Stop after this many frame periods.
    pub max_frames: Option<u64>,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            frame_duration: Some(FRAME_DURATION_NTSC),
            max_frames: None,
        }
    }
}

pub struct Emulation {
    ppu: Ppu,
    assembler: AssemblerHandle,
    config: EmulationConfig,
}

impl Emulation {
    /// Routes the PPU's snapshots into a fresh mailbox and starts `assembler`
    /// on the other end.
    pub fn new(
        mut ppu: Ppu,
        assembler: FrameAssembler,
        config: EmulationConfig,
    ) -> Result<Self, RuntimeError> {
        let (sender, receiver) = mailbox::<Arc<FrameSnapshot>>();
        ppu.set_snapshot_sink(Box::new(sender));
        let assembler = assembler.spawn(receiver)?;
        Ok(Self {
            ppu,
            assembler,
            config,
        })
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    /// Runs until `stop` is set, the frame limit is reached, or either side
    /// fails. Returns the number of frame periods completed by this call.
    pub fn run(&mut self, cpu: &mut impl Cpu, stop: &AtomicBool) -> Result<u64, RuntimeError> {
        let mut frames = 0u64;
        let mut next_deadline = Instant::now();
        info!(config = ?self.config, "emulation started");

        while !stop.load(Ordering::Acquire) {
            if let Err(err) = cpu.cycle(&mut self.ppu) {
                error!(%err, "CPU step failed");
                return Err(err.into());
            }
            if self.ppu.tick().is_none() {
                continue;
            }

            frames += 1;
            self.check_assembler()?;
            if self.config.max_frames.is_some_and(|max| frames >= max) {
                debug!(frames, "frame limit reached");
                break;
            }
            if let Some(duration) = self.config.frame_duration {
                next_deadline = pace(next_deadline, duration);
            }
        }

        info!(frames, "emulation stopped");
        Ok(frames)
    }

    /// Closes the snapshot channel and waits for the assembler to drain.
    pub fn shutdown(self) -> Result<(), RuntimeError> {
        let Emulation { ppu, assembler, .. } = self;
        drop(ppu);
        assembler.join()
    }

    fn check_assembler(&self) -> Result<(), RuntimeError> {
        if let Some(err) = self.assembler.try_fault() {
            error!(%err, "frame assembler failed");
            return Err(err.into());
        }
        if self.assembler.is_finished() {
            return Err(RuntimeError::AssemblerStopped);
        }
        Ok(())
    }
}

/// Sleeps until `deadline + duration` and returns the next deadline. A driver
/// that fell more than two frames behind resynchronizes instead of bursting.
fn pace(deadline: Instant, duration: Duration) -> Instant {
    let next = deadline + duration;
    let now = Instant::now();
    if next > now {
        thread::sleep(next - now);
        next
    } else if now - next > duration * 2 {
        now
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use famiview_core::{
        ChrPatternTable, FrameBuffer, Palette, PatternTable, memory::Register,
        ppu::registers::Control,
    };

    use super::*;
    use crate::assembler::AssemblerConfig;

    fn assembler(presented: &Arc<AtomicU64>) -> FrameAssembler {
        let patterns: Arc<dyn PatternTable> = Arc::new(ChrPatternTable::new(vec![0u8; 0x2000]));
        let presented = Arc::clone(presented);
        FrameAssembler::new(patterns, Palette::ntsc(), move |_: &FrameBuffer| {
            presented.fetch_add(1, Ordering::SeqCst);
        })
        .with_config(AssemblerConfig {
            pacing: Duration::ZERO,
        })
    }

    fn unthrottled(max_frames: u64) -> EmulationConfig {
        EmulationConfig {
            frame_duration: None,
            max_frames: Some(max_frames),
        }
    }

    #[test]
    fn runs_requested_frames_then_drains() {
        let presented = Arc::new(AtomicU64::new(0));
        let mut emulation =
            Emulation::new(Ppu::new(), assembler(&presented), unthrottled(3)).expect("start");
        let mut idle = |_: &mut Ppu| -> Result<(), Error> { Ok(()) };
        let frames = emulation
            .run(&mut idle, &AtomicBool::new(false))
            .expect("run");
        assert_eq!(frames, 3);
        assert_eq!(emulation.ppu().frame(), 3);

        emulation.shutdown().expect("shutdown");
        let presented = presented.load(Ordering::SeqCst);
        assert!((1..=3).contains(&presented), "presented {presented}");
    }

    #[test]
    fn stop_flag_ends_run_immediately() {
        let presented = Arc::new(AtomicU64::new(0));
        let mut emulation =
            Emulation::new(Ppu::new(), assembler(&presented), unthrottled(100)).expect("start");
        let mut idle = |_: &mut Ppu| -> Result<(), Error> { Ok(()) };
        let frames = emulation
            .run(&mut idle, &AtomicBool::new(true))
            .expect("run");
        assert_eq!(frames, 0);
        assert_eq!(emulation.ppu().ticks(), 0);
        emulation.shutdown().expect("shutdown");
    }

    #[test]
    fn cpu_error_aborts_run() {
        let presented = Arc::new(AtomicU64::new(0));
        let mut emulation =
            Emulation::new(Ppu::new(), assembler(&presented), unthrottled(100)).expect("start");
        let mut steps = 0u32;
        let mut scroller = |ppu: &mut Ppu| -> Result<(), Error> {
            steps += 1;
            if steps == 10 {
                ppu.write(Register::Scroll.offset(), 3)?;
            }
            Ok(())
        };

        let err = emulation
            .run(&mut scroller, &AtomicBool::new(false))
            .expect_err("scroll");
        assert!(err.is_unsupported_feature());
        assert_eq!(emulation.ppu().ticks(), 9);
        emulation.shutdown().expect("shutdown");
    }

    #[test]
    fn assembler_fault_stops_driver() {
        let presented = Arc::new(AtomicU64::new(0));
        let mut ppu = Ppu::new();
        ppu.write(Register::Control.offset(), Control::SPRITE_SIZE_16.bits())
            .expect("ctrl");
        let config = EmulationConfig {
            frame_duration: Some(Duration::from_millis(5)),
            max_frames: Some(200),
        };
        let mut emulation = Emulation::new(ppu, assembler(&presented), config).expect("start");
        let mut idle = |_: &mut Ppu| -> Result<(), Error> { Ok(()) };

        let err = emulation
            .run(&mut idle, &AtomicBool::new(false))
            .expect_err("tall sprites");
        assert!(matches!(
            err,
            RuntimeError::Core(Error::TallSpritesUnsupported) | RuntimeError::AssemblerStopped
        ));
        assert!(emulation.ppu().frame() < 200);
        assert_eq!(presented.load(Ordering::SeqCst), 0);
    }
}

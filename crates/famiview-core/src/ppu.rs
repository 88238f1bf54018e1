//! Picture Processing Unit (PPU) register and timing core.
//!
//! The CPU drives the PPU through eight mirrored registers plus the OAM DMA
//! and controller ports. This module owns VRAM, OAM and the register latches,
//! and counts ticks so that every frame period it can raise the vblank NMI and
//! hand an immutable [`FrameSnapshot`] to the rendering side. Timing is frame
//! accurate only: nothing here models individual scanlines or dots.

pub mod registers;
mod snapshot;
mod sprite;

use core::fmt;
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::{
    controller::{ControllerLatch, ControllerState},
    error::Error,
    memory::{Register, frame, oam, vram},
};
use registers::{Control, Registers, Status};

pub use snapshot::{FrameSnapshot, NAMETABLE_LEN};
pub use sprite::{HIDDEN_Y, Sprite, SpriteAttributes};

/// Length of one OAM DMA transfer.
const DMA_LEN: u16 = oam::SIZE as u16;

/// Interrupt lines the PPU can assert on the CPU collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    Irq,
    Nmi,
}

impl Interrupt {
    pub fn is_maskable(self) -> bool {
        matches!(self, Interrupt::Irq)
    }
}

/// Callback invoked when the PPU signals the CPU.
pub type InterruptHandler = Box<dyn FnMut(Interrupt) + Send>;

/// Byte-addressable view of CPU memory, used as the OAM DMA source.
pub trait CpuMemory {
    fn read(&self, addr: u16) -> u8;
}

impl CpuMemory for [u8] {
    fn read(&self, addr: u16) -> u8 {
        self.get(addr as usize).copied().unwrap_or(0)
    }
}

impl<const N: usize> CpuMemory for [u8; N] {
    fn read(&self, addr: u16) -> u8 {
        CpuMemory::read(self.as_slice(), addr)
    }
}

impl CpuMemory for Vec<u8> {
    fn read(&self, addr: u16) -> u8 {
        CpuMemory::read(self.as_slice(), addr)
    }
}

impl<T: CpuMemory + ?Sized> CpuMemory for Box<T> {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }
}

impl<T: CpuMemory + ?Sized> CpuMemory for Arc<T> {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }
}

/// Receiver of published frame snapshots. `publish` runs on the tick caller's
/// thread and must return without waiting for the consumer.
pub trait SnapshotSink: Send {
    fn publish(&self, snapshot: Arc<FrameSnapshot>);
}

/// PPU state: memories, register latches, tick counter and collaborator hooks.
pub struct Ppu {
    /// Collection of CPU visible registers and their helper latches.
    registers: Registers,
    /// 16 KiB video memory, addressed through 14 bits.
    vram: Box<[u8; vram::SIZE]>,
    /// Sprite attribute memory. Only OAM DMA writes it.
    oam: Box<[u8; oam::SIZE]>,
    /// Controller port 1 shift register.
    controller: ControllerLatch,
    /// Ticks since power-on.
    ticks: u64,
    /// Completed frame periods.
    frame: u64,
    interrupt: Option<InterruptHandler>,
    cpu_memory: Option<Box<dyn CpuMemory + Send>>,
    snapshot_sink: Option<Box<dyn SnapshotSink>>,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("registers", &self.registers)
            .field("controller", &self.controller)
            .field("ticks", &self.ticks)
            .field("frame", &self.frame)
            .field("interrupt_bound", &self.interrupt.is_some())
            .field("cpu_memory_bound", &self.cpu_memory.is_some())
            .field("snapshot_sink_bound", &self.snapshot_sink.is_some())
            .finish()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Creates a PPU with cleared memories and its own controller state.
    pub fn new() -> Self {
        Self::with_controller(ControllerState::new())
    }

    /// Creates a PPU whose controller port samples `state`.
    pub fn with_controller(state: ControllerState) -> Self {
        Self {
            registers: Registers::default(),
            vram: Box::new([0; vram::SIZE]),
            oam: Box::new([0; oam::SIZE]),
            controller: ControllerLatch::new(state),
            ticks: 0,
            frame: 0,
            interrupt: None,
            cpu_memory: None,
            snapshot_sink: None,
        }
    }

    /// Restores the power-on state. Bound collaborators stay attached.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.vram.fill(0);
        self.oam.fill(0);
        self.controller.reset();
        self.ticks = 0;
        self.frame = 0;
    }

    /// Binds the CPU interrupt line.
    pub fn set_interrupt_handler(&mut self, handler: impl FnMut(Interrupt) + Send + 'static) {
        self.interrupt = Some(Box::new(handler));
    }

    /// Binds the memory OAM DMA copies from.
    pub fn set_cpu_memory(&mut self, memory: Box<dyn CpuMemory + Send>) {
        self.cpu_memory = Some(memory);
    }

    /// Binds the receiver of vblank snapshots.
    pub fn set_snapshot_sink(&mut self, sink: Box<dyn SnapshotSink>) {
        self.snapshot_sink = Some(sink);
    }

    /// Handle to the button bit-vector sampled by controller port 1.
    pub fn controller_state(&self) -> ControllerState {
        self.controller.state().clone()
    }

    /// Handles a write to a device address.
    ///
    /// Unmapped addresses are ignored. A non-zero scroll write is rejected
    /// because scrolling is not modeled.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Error> {
        let Some(register) = Register::decode(addr) else {
            trace!(addr, value, "write to unmapped address ignored");
            return Ok(());
        };

        match register {
            Register::Control => self.registers.control = Control::from_bits_retain(value),
            Register::Mask
            | Register::Status
            | Register::OamAddr
            | Register::OamData
            | Register::Controller2 => {}
            Register::Scroll => {
                if value != 0 {
                    error!(value, "non-zero PPUSCROLL write");
                    return Err(Error::ScrollUnsupported { value });
                }
            }
            Register::Addr => {
                if let Some(addr) = self.registers.addr.write(value) {
                    trace!(addr, "VRAM address latched");
                }
            }
            Register::Data => self.write_vram_data(value),
            Register::OamDma => self.dma(value),
            Register::Controller1 => self.controller.write(value),
        }
        Ok(())
    }

    /// Handles a read from a device address. Registers without read-back
    /// and unmapped addresses return 0.
    pub fn read(&mut self, addr: u16) -> u8 {
        match Register::decode(addr) {
            Some(Register::Data) => self.read_vram_data(),
            Some(Register::Status) => Status::REPORTED.bits(),
            Some(Register::Controller1) => self.controller.read(),
            _ => 0,
        }
    }

    /// Copies the 256-byte CPU page `page << 8` into OAM.
    pub fn dma(&mut self, page: u8) {
        let Some(memory) = self.cpu_memory.as_deref() else {
            warn!(page, "OAM DMA requested with no CPU memory bound");
            return;
        };
        let base = u16::from(page) << 8;
        for (offset, byte) in (0..DMA_LEN).zip(self.oam.iter_mut()) {
            *byte = memory.read(base.wrapping_add(offset));
        }
        debug!(page, "OAM DMA complete");
    }

    /// Advances the tick counter by one.
    ///
    /// The last tick of every frame period raises the NMI (when enabled) and
    /// publishes a snapshot, which is also returned.
    pub fn tick(&mut self) -> Option<Arc<FrameSnapshot>> {
        let index = self.ticks;
        self.ticks = self.ticks.wrapping_add(1);
        if index % frame::PERIOD_TICKS != frame::PERIOD_TICKS - 1 {
            return None;
        }

        let nmi = self.registers.control.nmi_enabled();
        if nmi {
            match self.interrupt.as_mut() {
                Some(handler) => handler(Interrupt::Nmi),
                None => warn!(frame = self.frame, "NMI enabled with no interrupt handler bound"),
            }
        }

        let snapshot = Arc::new(self.snapshot());
        debug!(frame = self.frame, nmi, "vblank snapshot");
        if let Some(sink) = &self.snapshot_sink {
            sink.publish(Arc::clone(&snapshot));
        }
        self.frame = self.frame.wrapping_add(1);
        Some(snapshot)
    }

    /// Captures the current render inputs without waiting for vblank.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self.frame, self.registers.control, &self.vram[..], &self.oam)
    }

    pub fn control(&self) -> Control {
        self.registers.control
    }

    /// Current VRAM address held by the `$2006` latch.
    pub fn vram_addr(&self) -> u16 {
        self.registers.addr.addr()
    }

    pub fn vram(&self) -> &[u8; vram::SIZE] {
        &self.vram
    }

    pub fn oam(&self) -> &[u8; oam::SIZE] {
        &self.oam
    }

    pub fn controller(&self) -> &ControllerLatch {
        &self.controller
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn write_vram_data(&mut self, value: u8) {
        let addr = self.registers.addr.addr();
        self.vram[(addr & vram::ADDR_MASK) as usize] = value;
        let increment = self.registers.control.vram_increment();
        self.registers.addr.increment(increment);
    }

    fn read_vram_data(&mut self) -> u8 {
        let addr = self.registers.addr.addr();
        let buffered = self.registers.read_buffer;
        self.registers.read_buffer = self.vram[(addr & vram::ADDR_MASK) as usize];
        let increment = self.registers.control.vram_increment();
        self.registers.addr.increment(increment);
        buffered
    }
}

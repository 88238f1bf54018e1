//! Shared definitions for the PPU-facing memory map.
//!
//! Address constants live here so the register decoder, the PPU state and the
//! frame assembler agree on one layout without magic numbers leaking into the
//! other modules.

/// Video memory layout.
pub mod vram {
    /// Addressable bytes of video memory (14 address bits).
    pub const SIZE: usize = 0x4000;
    /// Mask applied to every VRAM address before use.
    pub const ADDR_MASK: u16 = 0x3FFF;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of one nametable including its attribute table.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Offset of the attribute table inside a nametable.
    pub const ATTRIBUTE_TABLE_OFFSET: usize = 0x03C0;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette region byte count (`$3F00-$3F1F`).
    pub const PALETTE_SIZE: usize = 0x20;
}

/// Sprite attribute memory layout.
pub mod oam {
    /// Primary OAM byte count.
    pub const SIZE: usize = 0x100;
    /// Number of sprite entries.
    pub const SPRITE_COUNT: usize = 64;
    /// Bytes per sprite entry.
    pub const BYTES_PER_SPRITE: usize = 4;
}

/// Frame geometry and timing.
pub mod frame {
    /// Visible width in pixels.
    pub const WIDTH: usize = 256;
    /// Visible height in pixels.
    pub const HEIGHT: usize = 240;
    /// Background tile columns.
    pub const TILE_COLUMNS: usize = 32;
    /// Background tile rows.
    pub const TILE_ROWS: usize = 30;
    /// Ticks between two vblank boundaries.
    pub const PERIOD_TICKS: u64 = 89_342;
}

/// Start of the CPU window mirrored onto the eight PPU registers.
pub const PPU_WINDOW_BASE: u16 = 0x2000;
/// Last CPU address of the PPU register mirror.
pub const PPU_WINDOW_END: u16 = 0x3FFF;
/// Mask selecting one of the eight PPU registers.
pub const REGISTER_SELECT_MASK: u16 = 0x0007;

/// Device-visible register identifiers.
///
/// The eight PPU registers are addressed through the register window
/// (`0x0000-0x1FFF`, mirrored every 8 bytes). DMA and the controller ports
/// keep their absolute CPU addresses.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Offset 0 - PPUCTRL
    Control = 0,
    /// Offset 1 - PPUMASK
    Mask = 1,
    /// Offset 2 - PPUSTATUS
    Status = 2,
    /// Offset 3 - OAMADDR
    OamAddr = 3,
    /// Offset 4 - OAMDATA
    OamData = 4,
    /// Offset 5 - PPUSCROLL
    Scroll = 5,
    /// Offset 6 - PPUADDR
    Addr = 6,
    /// Offset 7 - PPUDATA
    Data = 7,
    /// `$4014` - OAMDMA
    OamDma = 0x4014,
    /// `$4016` - controller port 1
    Controller1 = 0x4016,
    /// `$4017` - controller port 2 (reserved)
    Controller2 = 0x4017,
}

impl Register {
    /// Canonical device address for this register.
    pub const fn offset(self) -> u16 {
        self as u16
    }

    /// Resolves a device address to a register, or `None` when nothing is
    /// wired at that address.
    pub const fn decode(addr: u16) -> Option<Self> {
        if addr < PPU_WINDOW_BASE {
            return Some(match addr & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            });
        }
        match addr {
            0x4014 => Some(Self::OamDma),
            0x4016 => Some(Self::Controller1),
            0x4017 => Some(Self::Controller2),
            _ => None,
        }
    }
}

/// Translates a CPU bus address into the device address understood by
/// [`Register::decode`].
///
/// `$2000-$3FFF` becomes a register-window offset; every other address is
/// passed through unchanged.
pub const fn io_offset(cpu_addr: u16) -> u16 {
    if cpu_addr >= PPU_WINDOW_BASE && cpu_addr <= PPU_WINDOW_END {
        cpu_addr - PPU_WINDOW_BASE
    } else {
        cpu_addr
    }
}

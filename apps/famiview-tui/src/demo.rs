//! Scripted stand-in for the CPU.
//!
//! On boot it uploads a palette, fills nametable 0 with consecutive tiles so
//! the whole pattern table is visible, and parks every sprite except one.
//! Each NMI it samples controller port 1, moves that sprite with the d-pad
//! and re-uploads OAM through `$4014`, the way a game's vblank handler would.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use famiview_core::{
    Button, CpuMemory, Error, Interrupt, Ppu,
    memory::{Register, frame, oam, vram},
    ppu::{HIDDEN_Y, SpriteAttributes, registers::Control},
};
use famiview_runtime::Cpu;
use parking_lot::Mutex;
use tracing::{debug, info};

/// 2 KiB of internal RAM, mirrored through `$0000-$1FFF`.
const RAM_SIZE: usize = 0x800;
const RAM_MASK: u16 = 0x07FF;
/// RAM page holding the OAM shadow copy.
const OAM_PAGE: u8 = 0x02;

#[rustfmt::skip]
const BOOT_PALETTE: [u8; vram::PALETTE_SIZE] = [
    0x0F, 0x00, 0x10, 0x30, 0x0F, 0x01, 0x21, 0x31, 0x0F, 0x06, 0x16, 0x26, 0x0F, 0x09, 0x19, 0x29,
    0x0F, 0x16, 0x27, 0x18, 0x0F, 0x1A, 0x30, 0x27, 0x0F, 0x16, 0x30, 0x27, 0x0F, 0x0F, 0x36, 0x17,
];

/// Attribute byte assigning all four background palettes inside each 4x4 block.
const BOOT_ATTRIBUTES: u8 = 0b11_10_01_00;

/// CPU RAM shared between the demo program and the PPU's DMA reads.
#[derive(Clone)]
pub struct SharedRam(Arc<Mutex<[u8; RAM_SIZE]>>);

impl SharedRam {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new([0; RAM_SIZE])))
    }

    fn write(&self, addr: u16, value: u8) {
        self.0.lock()[usize::from(addr & RAM_MASK)] = value;
    }

    fn write_block(&self, addr: u16, bytes: &[u8]) {
        let start = usize::from(addr & RAM_MASK);
        self.0.lock()[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl CpuMemory for SharedRam {
    fn read(&self, addr: u16) -> u8 {
        self.0.lock()[usize::from(addr & RAM_MASK)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Player {
    x: u8,
    y: u8,
    tile: u8,
    attributes: SpriteAttributes,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            x: (frame::WIDTH / 2) as u8,
            y: (frame::HEIGHT / 2) as u8,
            tile: 0x01,
            attributes: SpriteAttributes::empty(),
        }
    }
}

pub struct DemoCpu {
    ram: SharedRam,
    nmi: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
    booted: bool,
    player: Player,
    previous_buttons: u8,
    sprite_table: u8,
}

impl DemoCpu {
    /// Binds the demo to `ppu`: RAM becomes the DMA source and the NMI line
    /// sets a flag polled by [`Cpu::cycle`].
    pub fn attach(ppu: &mut Ppu, reset: Arc<AtomicBool>, sprite_table: u8) -> Self {
        let ram = SharedRam::new();
        ppu.set_cpu_memory(Box::new(ram.clone()));

        let nmi = Arc::new(AtomicBool::new(false));
        let line = Arc::clone(&nmi);
        ppu.set_interrupt_handler(move |interrupt| {
            if interrupt == Interrupt::Nmi {
                line.store(true, Ordering::Release);
            }
        });

        Self {
            ram,
            nmi,
            reset,
            booted: false,
            player: Player::default(),
            previous_buttons: 0,
            sprite_table,
        }
    }

    fn boot(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        ppu.write(Register::Control.offset(), 0)?;
        ppu.write(Register::Scroll.offset(), 0)?;

        set_vram_addr(ppu, vram::PALETTE_BASE)?;
        for byte in BOOT_PALETTE {
            ppu.write(Register::Data.offset(), byte)?;
        }

        set_vram_addr(ppu, vram::NAMETABLE_BASE)?;
        for cell in 0..frame::TILE_COLUMNS * frame::TILE_ROWS {
            ppu.write(Register::Data.offset(), cell as u8)?;
        }
        for _ in 0..vram::NAMETABLE_SIZE as usize - vram::ATTRIBUTE_TABLE_OFFSET {
            ppu.write(Register::Data.offset(), BOOT_ATTRIBUTES)?;
        }

        let oam_base = u16::from(OAM_PAGE) << 8;
        for index in 0..oam::SPRITE_COUNT {
            self.ram
                .write(oam_base + (index * oam::BYTES_PER_SPRITE) as u16, HIDDEN_Y);
        }
        self.player = Player::default();
        self.upload_player(ppu)?;

        let mut control = Control::GENERATE_NMI;
        control.set(Control::SPRITE_TABLE, self.sprite_table == 1);
        ppu.write(Register::Control.offset(), control.bits())?;

        self.booted = true;
        info!("demo program booted");
        Ok(())
    }

    fn read_buttons(ppu: &mut Ppu) -> Result<u8, Error> {
        ppu.write(Register::Controller1.offset(), 1)?;
        ppu.write(Register::Controller1.offset(), 0)?;
        Ok(Button::ALL.iter().fold(0, |bits, button| {
            bits | ((ppu.read(Register::Controller1.offset()) & 1) << *button as u8)
        }))
    }

    fn vblank(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        let buttons = Self::read_buttons(ppu)?;
        let pressed = |button: Button| buttons & button.mask() != 0;
        let newly = |button: Button| pressed(button) && self.previous_buttons & button.mask() == 0;

        let player = &mut self.player;
        if pressed(Button::Left) {
            player.x = player.x.saturating_sub(1);
        }
        if pressed(Button::Right) {
            player.x = player.x.saturating_add(1);
        }
        if pressed(Button::Up) {
            player.y = player.y.saturating_sub(1);
        }
        // 0xFF would hide the sprite.
        if pressed(Button::Down) {
            player.y = player.y.saturating_add(1).min(HIDDEN_Y - 1);
        }
        if newly(Button::A) {
            let palette = (player.attributes.bits() + 1) & SpriteAttributes::PALETTE.bits();
            player.attributes.remove(SpriteAttributes::PALETTE);
            player.attributes.insert(SpriteAttributes::from_bits_retain(palette));
        }
        if newly(Button::B) {
            player.attributes.toggle(SpriteAttributes::FLIP_HORIZONTAL);
        }
        if newly(Button::Select) {
            player.tile = player.tile.wrapping_sub(1);
        }
        if newly(Button::Start) {
            player.tile = player.tile.wrapping_add(1);
        }
        self.previous_buttons = buttons;

        self.upload_player(ppu)
    }

    fn upload_player(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        let Player {
            x,
            y,
            tile,
            attributes,
        } = self.player;
        self.ram
            .write_block(u16::from(OAM_PAGE) << 8, &[y, tile, attributes.bits(), x]);
        ppu.write(Register::OamDma.offset(), OAM_PAGE)?;
        debug!(x, y, tile, "sprite uploaded");
        Ok(())
    }
}

impl Cpu for DemoCpu {
    fn cycle(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        if self.reset.swap(false, Ordering::AcqRel) {
            info!("reset requested");
            ppu.reset();
            self.booted = false;
            self.previous_buttons = 0;
            self.nmi.store(false, Ordering::Release);
        }
        if !self.booted {
            return self.boot(ppu);
        }
        if self.nmi.swap(false, Ordering::AcqRel) {
            self.vblank(ppu)?;
        }
        Ok(())
    }
}

fn set_vram_addr(ppu: &mut Ppu, addr: u16) -> Result<(), Error> {
    ppu.write(Register::Addr.offset(), (addr >> 8) as u8)?;
    ppu.write(Register::Addr.offset(), addr as u8)
}

use crate::memory::{oam, vram};

use super::{Sprite, registers::Control};

/// Bytes of one nametable including its attribute table.
pub const NAMETABLE_LEN: usize = vram::NAMETABLE_SIZE as usize;

/// Everything the renderer needs to draw one frame, copied out of the PPU at
/// the vblank boundary.
///
/// All buffers are owned copies, so later VRAM/OAM writes never reach a
/// snapshot that has already been published.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    frame: u64,
    background_table: u8,
    sprite_table: u8,
    tall_sprites: bool,
    nametable: Box<[u8; NAMETABLE_LEN]>,
    oam: Box<[u8; oam::SIZE]>,
    palette: [u8; vram::PALETTE_SIZE],
}

impl FrameSnapshot {
    /// Captures the selected nametable, OAM and palette region.
    pub(crate) fn capture(frame: u64, control: Control, vram: &[u8], oam: &[u8; oam::SIZE]) -> Self {
        let base = control.base_nametable_addr() as usize;
        let mut nametable = Box::new([0u8; NAMETABLE_LEN]);
        nametable.copy_from_slice(&vram[base..base + NAMETABLE_LEN]);

        let palette_base = vram::PALETTE_BASE as usize;
        let mut palette = [0u8; vram::PALETTE_SIZE];
        palette.copy_from_slice(&vram[palette_base..palette_base + vram::PALETTE_SIZE]);

        Self {
            frame,
            background_table: control.background_table(),
            sprite_table: control.sprite_table(),
            tall_sprites: control.use_8x16_sprites(),
            nametable,
            oam: Box::new(*oam),
            palette,
        }
    }

    /// Sequence number of the frame period that produced this snapshot.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Background pattern table selector (0 or 1).
    pub fn background_table(&self) -> u8 {
        self.background_table
    }

    /// Sprite pattern table selector (0 or 1).
    pub fn sprite_table(&self) -> u8 {
        self.sprite_table
    }

    /// `true` when the control register asked for 8x16 sprites.
    pub fn tall_sprites(&self) -> bool {
        self.tall_sprites
    }

    /// 960 tile indices followed by the 64-byte attribute table.
    pub fn nametable(&self) -> &[u8; NAMETABLE_LEN] {
        &self.nametable
    }

    pub fn oam(&self) -> &[u8; oam::SIZE] {
        &self.oam
    }

    /// Copy of `$3F00-$3F1F`: four background then four sprite palettes.
    pub fn palette(&self) -> &[u8; vram::PALETTE_SIZE] {
        &self.palette
    }

    pub fn sprites(&self) -> impl DoubleEndedIterator<Item = Sprite> + '_ {
        Sprite::iter(&self.oam[..])
    }
}

impl core::fmt::Debug for FrameSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameSnapshot")
            .field("frame", &self.frame)
            .field("background_table", &self.background_table)
            .field("sprite_table", &self.sprite_table)
            .field("tall_sprites", &self.tall_sprites)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

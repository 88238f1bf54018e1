use bitflags::bitflags;

use crate::memory::vram;

bitflags! {
    /// PPU control register (`$2000`).
    ///
    /// The register selects the nametable and pattern tables handed to the
    /// renderer, the sprite size, the `$2007` auto-increment step and whether
    /// a vblank raises an NMI.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N M S B s I n n
    /// ```
    /// - `n n`: base nametable select
    /// - `I`: VRAM increment (0=+1, 1=+32)
    /// - `s`: sprite pattern table (8x8)
    /// - `B`: background pattern table
    /// - `S`: sprite size (0=8x8, 1=8x16)
    /// - `M`: master/slave select
    /// - `N`: generate NMI at VBlank start
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u8 {
        /// Selects the base nametable address (bits 0 and 1).
        ///
        /// - `00`: `$2000`
        /// - `01`: `$2400`
        /// - `10`: `$2800`
        /// - `11`: `$2C00`
        const NAMETABLE = 0b0000_0011;

        /// Controls the VRAM address increment unit (bit 2).
        /// `0` increments by 1 (horizontal), `1` increments by 32 (vertical).
        const INCREMENT_32 = 0b0000_0100;

        /// Selects the sprite pattern table for 8x8 sprites (bit 3).
        const SPRITE_TABLE = 0b0000_1000;

        /// Selects the background pattern table (bit 4).
        const BACKGROUND_TABLE = 0b0001_0000;

        /// Chooses the sprite size (bit 5).
        /// `0` renders 8x8 sprites, `1` requests 8x16 sprites.
        const SPRITE_SIZE_16 = 0b0010_0000;

        /// Master/slave select (bit 6). Stored, never acted upon.
        const MASTER_SLAVE = 0b0100_0000;

        /// Enables NMI generation at the start of VBlank (bit 7).
        const GENERATE_NMI = 0b1000_0000;
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::empty()
    }
}

impl Control {
    /// Returns the nametable select bits (0..3).
    pub fn nametable_index(self) -> u8 {
        self.bits() & 0b11
    }

    /// Computes the base nametable address (`$2000`, `$2400`, `$2800`, `$2C00`).
    pub fn base_nametable_addr(self) -> u16 {
        vram::NAMETABLE_BASE + u16::from(self.nametable_index()) * vram::NAMETABLE_SIZE
    }

    /// Returns the VRAM increment amount (1 or 32) based on bit 2.
    pub fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) {
            32
        } else {
            1
        }
    }

    /// Sprite pattern table selector (0 or 1).
    pub fn sprite_table(self) -> u8 {
        u8::from(self.contains(Control::SPRITE_TABLE))
    }

    /// Background pattern table selector (0 or 1).
    pub fn background_table(self) -> u8 {
        u8::from(self.contains(Control::BACKGROUND_TABLE))
    }

    /// Indicates whether sprites use the 8x16 mode.
    pub fn use_8x16_sprites(self) -> bool {
        self.contains(Control::SPRITE_SIZE_16)
    }

    /// Indicates whether the PPU should fire an NMI at the start of VBlank.
    pub fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_selector_bits() {
        let control = Control::from_bits_retain(0b1011_1110);
        assert!(control.nmi_enabled());
        assert!(control.use_8x16_sprites());
        assert_eq!(control.background_table(), 1);
        assert_eq!(control.sprite_table(), 1);
        assert_eq!(control.vram_increment(), 32);
        assert_eq!(control.nametable_index(), 2);
        assert_eq!(control.base_nametable_addr(), 0x2800);
    }

    #[test]
    fn empty_control_selects_defaults() {
        let control = Control::default();
        assert!(!control.nmi_enabled());
        assert_eq!(control.vram_increment(), 1);
        assert_eq!(control.base_nametable_addr(), 0x2000);
    }
}

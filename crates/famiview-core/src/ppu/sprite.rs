use bitflags::bitflags;

use crate::memory::oam::BYTES_PER_SPRITE;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    /// - `V`: Vertical flip
    /// - `H`: Horizontal flip
    /// - `P`: Priority (behind background when set)
    /// - `p`: Sprite palette select (0..=3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpriteAttributes: u8 {
        /// Sprite palette select mask.
        const PALETTE = 0b0000_0011;

        /// When set, sprite is drawn behind the background.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;

        /// Horizontal flip.
        const FLIP_HORIZONTAL = 0b0100_0000;

        /// Vertical flip.
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

/// Y coordinate marking an OAM entry as unused.
pub const HIDDEN_Y: u8 = 0xFF;

/// First palette group reserved for sprites in the 32-byte palette region.
const SPRITE_PALETTE_BASE: u8 = 4;

/// Decoded OAM entry.
///
/// The hardware encodes each sprite as four consecutive bytes:
/// - byte 0: Y position
/// - byte 1: tile index
/// - byte 2: attribute bits (see [`SpriteAttributes`])
/// - byte 3: X position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sprite {
    pub y: u8,
    pub tile: u8,
    pub attributes: SpriteAttributes,
    pub x: u8,
}

impl Sprite {
    /// Decodes one four-byte entry.
    pub fn from_bytes(bytes: [u8; BYTES_PER_SPRITE]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_retain(bytes[2]),
            x: bytes[3],
        }
    }

    /// Iterates over all sprites in the given OAM slice, in index order.
    ///
    /// Remainder bytes past the last full entry are ignored.
    pub fn iter(oam: &[u8]) -> impl DoubleEndedIterator<Item = Sprite> + '_ {
        oam.chunks_exact(BYTES_PER_SPRITE)
            .map(|chunk| Sprite::from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }

    /// Entries parked at Y=255 are not drawn.
    pub fn is_hidden(&self) -> bool {
        self.y == HIDDEN_Y
    }

    pub fn flip_horizontal(&self) -> bool {
        self.attributes.contains(SpriteAttributes::FLIP_HORIZONTAL)
    }

    pub fn flip_vertical(&self) -> bool {
        self.attributes.contains(SpriteAttributes::FLIP_VERTICAL)
    }

    /// Palette group (4..=7) inside the 32-byte palette region.
    pub fn palette_group(&self) -> u8 {
        (self.attributes.bits() & SpriteAttributes::PALETTE.bits()) + SPRITE_PALETTE_BASE
    }
}

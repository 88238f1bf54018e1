//! Pattern-table access.
//!
//! Tile graphics live outside the PPU (CHR ROM/RAM on the cartridge). The
//! renderer only needs decoded 8x8 color-index matrices, so the boundary is a
//! small trait; [`ChrPatternTable`] is the stock implementation over raw CHR
//! bytes.

use crate::error::Error;

/// 8x8 tile of 2-bit color indices, indexed `[row][column]`.
pub type Tile = [[u8; 8]; 8];

/// Bytes per encoded tile (two 8-byte bit planes).
pub const TILE_BYTES: usize = 16;
/// Tiles per pattern table.
pub const TILES_PER_TABLE: usize = 256;

/// Source of decoded tile graphics.
pub trait PatternTable: Send + Sync {
    /// Fetches tile `index` from pattern table `table` (0 or 1).
    ///
    /// `tall` requests the 8x16 tile pair used by tall sprites.
    fn tile(&self, index: u8, table: u8, tall: bool) -> Result<Tile, Error>;
}

/// Pattern tables backed by raw CHR data.
///
/// Table 0 covers tiles `0..256`, table 1 the next 256. Bytes past the end of
/// the data read as zero, like an empty CHR bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChrPatternTable {
    chr: Box<[u8]>,
}

impl ChrPatternTable {
    pub fn new(chr: impl Into<Box<[u8]>>) -> Self {
        Self { chr: chr.into() }
    }

    pub fn len(&self) -> usize {
        self.chr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chr.is_empty()
    }

    #[inline]
    fn byte(&self, addr: usize) -> u8 {
        self.chr.get(addr).copied().unwrap_or(0)
    }
}

impl PatternTable for ChrPatternTable {
    fn tile(&self, index: u8, table: u8, tall: bool) -> Result<Tile, Error> {
        if tall {
            return Err(Error::TallSpritesUnsupported);
        }

        let base = (index as usize + TILES_PER_TABLE * (table & 1) as usize) * TILE_BYTES;
        let mut tile = [[0u8; 8]; 8];
        for (row, pixels) in tile.iter_mut().enumerate() {
            let plane0 = self.byte(base + row);
            let plane1 = self.byte(base + row + 8);
            // Bit 7 is the leftmost pixel.
            for bit in 0..8 {
                let lo = (plane0 >> bit) & 1;
                let hi = (plane1 >> bit) & 1;
                pixels[7 - bit] = (hi << 1) | lo;
            }
        }
        Ok(tile)
    }
}

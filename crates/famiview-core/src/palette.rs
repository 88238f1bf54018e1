//! Hardware color table.
//!
//! The PPU never stores RGB values. Palette RAM holds 6-bit indices into a
//! fixed 64-entry master palette that the video encoder turns into a signal;
//! this module maps those indices to RGB triples for display.

use crate::error::Error;

/// Number of entries in the master palette.
pub const PALETTE_LEN: usize = 64;

/// 8-bit per channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

#[rustfmt::skip]
const NTSC: [Rgb; PALETTE_LEN] = [
    rgb(124, 124, 124), rgb(0, 0, 252),     rgb(0, 0, 188),     rgb(68, 40, 188),
    rgb(148, 0, 132),   rgb(168, 0, 32),    rgb(168, 16, 0),    rgb(136, 20, 0),
    rgb(80, 48, 0),     rgb(0, 120, 0),     rgb(0, 104, 0),     rgb(0, 88, 0),
    rgb(0, 64, 88),     rgb(0, 0, 0),       rgb(0, 0, 0),       rgb(0, 0, 0),
    rgb(188, 188, 188), rgb(0, 120, 248),   rgb(0, 88, 248),    rgb(104, 68, 252),
    rgb(216, 0, 204),   rgb(228, 0, 88),    rgb(248, 56, 0),    rgb(228, 92, 16),
    rgb(172, 124, 0),   rgb(0, 184, 0),     rgb(0, 168, 0),     rgb(0, 168, 68),
    rgb(0, 136, 136),   rgb(0, 0, 0),       rgb(0, 0, 0),       rgb(0, 0, 0),
    rgb(248, 248, 248), rgb(60, 188, 252),  rgb(104, 136, 252), rgb(152, 120, 248),
    rgb(248, 120, 248), rgb(248, 88, 152),  rgb(248, 120, 88),  rgb(252, 160, 68),
    rgb(248, 184, 0),   rgb(184, 248, 24),  rgb(88, 216, 84),   rgb(88, 248, 152),
    rgb(0, 232, 216),   rgb(120, 120, 120), rgb(0, 0, 0),       rgb(0, 0, 0),
    rgb(252, 252, 252), rgb(164, 228, 252), rgb(184, 184, 248), rgb(216, 184, 248),
    rgb(248, 184, 248), rgb(248, 164, 192), rgb(240, 208, 176), rgb(252, 224, 168),
    rgb(248, 216, 120), rgb(216, 248, 120), rgb(184, 248, 184), rgb(184, 248, 216),
    rgb(0, 252, 252),   rgb(248, 216, 248), rgb(0, 0, 0),       rgb(0, 0, 0),
];

/// Mapping from 6-bit hardware color indices to RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; PALETTE_LEN],
}

impl Default for Palette {
    fn default() -> Self {
        Self::ntsc()
    }
}

impl Palette {
    /// The stock NTSC table.
    pub const fn ntsc() -> Self {
        Self { colors: NTSC }
    }

    /// Parses a `.pal` dump: 64 RGB triples (192 bytes) or 64 RGBA quads
    /// (256 bytes, alpha ignored).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let stride = match bytes.len() {
            192 => 3,
            256 => 4,
            actual => return Err(Error::InvalidPaletteSize { actual }),
        };
        let mut colors = [Rgb::default(); PALETTE_LEN];
        for (color, chunk) in colors.iter_mut().zip(bytes.chunks_exact(stride)) {
            *color = Rgb::new(chunk[0], chunk[1], chunk[2]);
        }
        Ok(Self { colors })
    }

    /// Looks up a hardware color. Indices past the table yield `None`.
    #[inline]
    pub fn color(&self, index: u8) -> Option<Rgb> {
        self.colors.get(index as usize).copied()
    }

    pub fn colors(&self) -> &[Rgb; PALETTE_LEN] {
        &self.colors
    }
}

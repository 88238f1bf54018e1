use thiserror::Error;

/// Failures surfaced by the PPU core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// PPUSCROLL received a non-zero value; scrolling is not modeled.
    #[error("feature not modeled: non-zero PPUSCROLL write ({value:#04X})")]
    ScrollUnsupported { value: u8 },
    /// The control register selects 8x16 sprites, which are not modeled.
    #[error("feature not modeled: 8x16 sprites")]
    TallSpritesUnsupported,
    /// A palette blob is neither 64 RGB triples nor 64 RGBA quads.
    #[error("palette blobs must be 192 or 256 bytes (got {actual})")]
    InvalidPaletteSize { actual: usize },
}

impl Error {
    /// Returns `true` for the fatal "hardware feature not modeled" class that
    /// must stop an emulation run.
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(
            self,
            Self::ScrollUnsupported { .. } | Self::TallSpritesUnsupported
        )
    }
}

//! Pattern data loading.
//!
//! The viewer only needs CHR bytes. For an iNES file they follow the 16-byte
//! header, the optional 512-byte trainer and the PRG ROM; anything without the
//! iNES magic is taken to be a raw CHR dump.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use bitflags::bitflags;
use tracing::{info, warn};

const NES_MAGIC: &[u8; 4] = b"NES\x1A";
const NES_HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Flags6: u8 {
        const MIRRORING = 0b0000_0001;
        const BATTERY   = 0b0000_0010;
        const TRAINER   = 0b0000_0100;
    }
}

pub fn load(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let chr = chr_section(&bytes).with_context(|| format!("invalid ROM {}", path.display()))?;
    if chr.is_empty() {
        warn!(path = %path.display(), "ROM uses CHR RAM; pattern tables start blank");
    }
    info!(path = %path.display(), chr_len = chr.len(), "pattern data loaded");
    Ok(chr)
}

/// Extracts the CHR ROM bytes from an iNES image, or returns the input
/// unchanged when it has no iNES header.
pub fn chr_section(bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(NES_MAGIC) {
        return Ok(bytes.to_vec());
    }
    ensure!(
        bytes.len() >= NES_HEADER_LEN,
        "iNES header truncated ({} bytes)",
        bytes.len()
    );

    let prg_len = usize::from(bytes[4]) * PRG_BANK_LEN;
    let chr_len = usize::from(bytes[5]) * CHR_BANK_LEN;
    let flags6 = Flags6::from_bits_truncate(bytes[6]);
    let trainer_len = if flags6.contains(Flags6::TRAINER) {
        TRAINER_LEN
    } else {
        0
    };

    let start = NES_HEADER_LEN + trainer_len + prg_len;
    let end = start + chr_len;
    ensure!(
        bytes.len() >= end,
        "CHR section ends at {end:#X} but file is {:#X} bytes",
        bytes.len()
    );
    Ok(bytes[start..end].to_vec())
}

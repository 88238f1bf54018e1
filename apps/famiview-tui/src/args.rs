use std::path::PathBuf;

use clap::Parser;

/// famiview: PPU viewer driven by a scripted CPU
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// iNES ROM (or raw CHR dump) supplying the pattern tables
    #[arg(required = true)]
    pub rom: PathBuf,

    /// 64-color `.pal` file (192 or 256 bytes); defaults to the NTSC table
    #[arg(long)]
    pub palette: Option<PathBuf>,

    /// Log filter, in `RUST_LOG` syntax
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file; the terminal itself is owned by the UI
    #[arg(long, default_value = "famiview.log")]
    pub log_file: PathBuf,

    /// Emulated frames per second, 0 runs unthrottled
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Release a held key after this long without a repeat event
    #[arg(long, default_value_t = 200)]
    pub release_timeout_ms: u64,
}

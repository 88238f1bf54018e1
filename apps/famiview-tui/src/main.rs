mod args;
mod chr;
mod demo;
mod input;
mod ui;

use std::{
    fs,
    io::{self, Stdout},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use famiview_core::{
    ChrPatternTable, Palette, PatternTable, Ppu,
    pattern::{TILE_BYTES, TILES_PER_TABLE},
};
use famiview_runtime::{
    Emulation, EmulationConfig, FrameAssembler, InputCapture, Keymap, RuntimeError,
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{args::Args, demo::DemoCpu, input::TerminalKeySource, ui::TerminalSink};

fn init_tracing(args: &Args) -> Result<WorkerGuard> {
    let _ = fs::remove_file(&args.log_file);
    let dir = args
        .log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = args
        .log_file
        .file_name()
        .context("log file path has no file name")?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&args.log_level)
        .with_context(|| format!("invalid log filter {:?}", args.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(guard)
}

/// Raw mode and the alternate screen for the lifetime of the guard.
struct TerminalGuard {
    enhanced_keys: bool,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        let enhanced_keys = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced_keys {
            execute!(
                stdout,
                EnterAlternateScreen,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES),
                Hide
            )?;
        } else {
            execute!(stdout, EnterAlternateScreen, Hide)?;
        }
        Ok(Self { enhanced_keys })
    }

    fn restore(stdout: &mut Stdout, enhanced_keys: bool) -> io::Result<()> {
        disable_raw_mode()?;
        if enhanced_keys {
            execute!(stdout, PopKeyboardEnhancementFlags, LeaveAlternateScreen, Show)
        } else {
            execute!(stdout, LeaveAlternateScreen, Show)
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = Self::restore(&mut io::stdout(), self.enhanced_keys) {
            error!(%err, "failed to restore terminal");
        }
    }
}

fn load_palette(path: Option<&Path>) -> Result<Palette> {
    let Some(path) = path else {
        return Ok(Palette::ntsc());
    };
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Palette::from_bytes(&bytes).with_context(|| format!("invalid palette {}", path.display()))
}

fn run(args: Args) -> Result<()> {
    let chr = chr::load(&args.rom)?;
    // Sprites use the second pattern table when the data has one.
    let sprite_table = u8::from(chr.len() > TILES_PER_TABLE * TILE_BYTES);
    let patterns: Arc<dyn PatternTable> = Arc::new(ChrPatternTable::new(chr));
    let palette = load_palette(args.palette.as_deref())?;
    let rom_name = args
        .rom
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown ROM")
        .to_string();

    let quit = Arc::new(AtomicBool::new(false));
    let reset = Arc::new(AtomicBool::new(false));

    let mut ppu = Ppu::new();
    let mut cpu = DemoCpu::attach(&mut ppu, Arc::clone(&reset), sprite_table);

    let _terminal = TerminalGuard::enter()?;
    let sink = TerminalSink::new(rom_name).context("failed to open terminal")?;
    let assembler = FrameAssembler::new(patterns, palette, sink);

    let source = TerminalKeySource::new(
        Duration::from_millis(args.release_timeout_ms),
        Arc::clone(&quit),
        reset,
    );
    let input = InputCapture::spawn(source, Keymap::default(), ppu.controller_state())?;

    let config = EmulationConfig {
        frame_duration: (args.fps > 0).then(|| Duration::from_secs(1) / args.fps),
        max_frames: None,
    };
    let mut emulation = Emulation::new(ppu, assembler, config)?;
    let outcome = emulation.run(&mut cpu, &quit);

    quit.store(true, Ordering::Release);
    input.stop();
    input.join();
    let drained = emulation.shutdown();

    let frames = outcome.map_err(describe)?;
    drained.map_err(describe)?;
    info!(frames, "viewer closed");
    Ok(())
}

fn describe(err: RuntimeError) -> anyhow::Error {
    if err.is_unsupported_feature() {
        anyhow::Error::new(err).context("ROM uses a PPU feature this viewer does not model")
    } else {
        err.into()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args)?;
    info!(rom = %args.rom.display(), fps = args.fps, "starting");

    let result = run(args);
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::{Result, ensure};
use famiview_core::{
    Button, ChrPatternTable, Error, FrameBuffer, Interrupt, Palette, PatternTable, Ppu, Rgb,
    memory::{Register, frame},
    ppu::registers::Control,
};
use famiview_runtime::{
    Emulation, EmulationConfig, FrameAssembler, InputCapture, KeyEvent, Keymap,
    assembler::AssemblerConfig,
};
use parking_lot::Mutex;

/// CPU stand-in: uploads a palette and one background tile, then on every
/// NMI reads controller port 1 and writes the A bit into nametable cell 1.
struct ScriptedCpu {
    booted: bool,
    nmi: Arc<AtomicBool>,
}

impl ScriptedCpu {
    fn set_addr(ppu: &mut Ppu, addr: u16) -> Result<(), Error> {
        ppu.write(Register::Addr.offset(), (addr >> 8) as u8)?;
        ppu.write(Register::Addr.offset(), addr as u8)
    }
}

impl famiview_runtime::Cpu for ScriptedCpu {
    fn cycle(&mut self, ppu: &mut Ppu) -> Result<(), Error> {
        if !self.booted {
            self.booted = true;
            Self::set_addr(ppu, 0x3F00)?;
            for byte in [0x0F, 0x16, 0x27, 0x18] {
                ppu.write(Register::Data.offset(), byte)?;
            }
            Self::set_addr(ppu, 0x2000)?;
            ppu.write(Register::Data.offset(), 1)?;
            ppu.write(Register::Control.offset(), Control::GENERATE_NMI.bits())?;
        }
        if self.nmi.swap(false, Ordering::AcqRel) {
            ppu.write(Register::Controller1.offset(), 1)?;
            ppu.write(Register::Controller1.offset(), 0)?;
            let a = ppu.read(Register::Controller1.offset());
            Self::set_addr(ppu, 0x2001)?;
            ppu.write(Register::Data.offset(), a)?;
        }
        Ok(())
    }
}

#[test]
fn input_flows_through_cpu_into_presented_frames() -> Result<()> {
    // Tile 1 is solid color index 1.
    let mut chr = vec![0u8; 0x2000];
    chr[16..24].fill(0xFF);
    let patterns: Arc<dyn PatternTable> = Arc::new(ChrPatternTable::new(chr));

    let last_frame: Arc<Mutex<Option<FrameBuffer>>> = Arc::new(Mutex::new(None));
    let display = Arc::clone(&last_frame);
    let assembler = FrameAssembler::new(patterns, Palette::ntsc(), move |frame: &FrameBuffer| {
        *display.lock() = Some(frame.clone());
    })
    .with_config(AssemblerConfig::default());

    let mut ppu = Ppu::new();
    let nmi = Arc::new(AtomicBool::new(false));
    let nmi_flag = Arc::clone(&nmi);
    ppu.set_interrupt_handler(move |interrupt| {
        if interrupt == Interrupt::Nmi {
            nmi_flag.store(true, Ordering::Release);
        }
    });

    let state = ppu.controller_state();
    let input = InputCapture::spawn(vec![KeyEvent::press('p')].into_iter(), Keymap::default(), state.clone())?;
    input.join();
    ensure!(state.is_pressed(Button::A), "key press reached the controller");

    let config = EmulationConfig {
        frame_duration: None,
        max_frames: Some(3),
    };
    let mut emulation = Emulation::new(ppu, assembler, config)?;
    let mut cpu = ScriptedCpu {
        booted: false,
        nmi,
    };
    let frames = emulation.run(&mut cpu, &AtomicBool::new(false))?;
    ensure!(frames == 3);
    ensure!(emulation.ppu().vram()[0x2001] == 1, "A bit written by the NMI handler");
    ensure!(emulation.ppu().frame() == 3);
    ensure!(emulation.ppu().ticks() == 3 * frame::PERIOD_TICKS);
    emulation.shutdown()?;

    let frame = last_frame.lock().take();
    let Some(frame) = frame else {
        anyhow::bail!("no frame presented");
    };
    let ntsc = Palette::ntsc();
    ensure!(frame.pixel(0, 0) == ntsc.color(0x16));
    ensure!(frame.pixel(16, 0) == Some(Rgb::default()));
    Ok(())
}

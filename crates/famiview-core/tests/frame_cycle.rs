use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, Result};
use ctor::ctor;
use famiview_core::{
    Button, ChrPatternTable, Interrupt, Palette, Ppu, Rgb, assemble,
    memory::{Register, frame},
    ppu::registers::Control,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

const PALETTE: [u8; 32] = [
    0x0F, 0x01, 0x11, 0x21, 0x0F, 0x06, 0x16, 0x26, 0x0F, 0x09, 0x19, 0x29, 0x0F, 0x02, 0x12, 0x22,
    0x0F, 0x14, 0x24, 0x34, 0x0F, 0x17, 0x27, 0x37, 0x0F, 0x1A, 0x2A, 0x3A, 0x0F, 0x1C, 0x2C, 0x3C,
];

fn write_addr(ppu: &mut Ppu, addr: u16) -> Result<()> {
    ppu.write(Register::Addr.offset(), (addr >> 8) as u8)?;
    ppu.write(Register::Addr.offset(), addr as u8)?;
    Ok(())
}

#[test]
fn palette_upload_survives_one_frame_period() -> Result<()> {
    let mut ppu = Ppu::new();
    let nmis = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&nmis);
    ppu.set_interrupt_handler(move |interrupt| {
        if interrupt == Interrupt::Nmi {
            seen.fetch_add(1, Ordering::SeqCst);
        }
    });

    ppu.write(Register::Control.offset(), Control::GENERATE_NMI.bits())?;
    write_addr(&mut ppu, 0x3F00)?;
    for byte in PALETTE {
        ppu.write(Register::Data.offset(), byte)?;
    }

    let mut published = Vec::new();
    for _ in 0..frame::PERIOD_TICKS {
        published.extend(ppu.tick());
    }

    assert_eq!(nmis.load(Ordering::SeqCst), 1);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].palette(), &PALETTE);
    assert_eq!(published[0].frame(), 0);
    Ok(())
}

#[test]
fn chr_tiles_render_through_the_snapshot() -> Result<()> {
    // Tile 1: plane 0 set on every row, so every pixel has color index 1.
    let mut chr = vec![0u8; 0x2000];
    chr[16..24].fill(0xFF);
    let patterns = ChrPatternTable::new(chr);

    let mut ppu = Ppu::new();
    write_addr(&mut ppu, 0x3F00)?;
    for byte in PALETTE {
        ppu.write(Register::Data.offset(), byte)?;
    }
    write_addr(&mut ppu, 0x2000)?;
    ppu.write(Register::Data.offset(), 1)?;

    let mut oam = vec![0u8; 0x800];
    for entry in oam[0x300..0x400].chunks_exact_mut(4) {
        entry[0] = 0xFF;
    }
    oam[0x300..0x304].copy_from_slice(&[100, 1, 0, 120]);
    ppu.set_cpu_memory(Box::new(oam));
    ppu.write(Register::OamDma.offset(), 0x03)?;

    let snapshot = (0..frame::PERIOD_TICKS)
        .find_map(|_| ppu.tick())
        .context("no snapshot published")?;
    let buffer = assemble(&snapshot, &patterns, &Palette::ntsc())?;

    let ntsc = Palette::ntsc();
    assert_eq!(buffer.pixel(3, 3), ntsc.color(PALETTE[1]));
    assert_eq!(buffer.pixel(8, 0), Some(Rgb::default()), "tile 0 stays transparent");
    assert_eq!(buffer.pixel(120, 100), ntsc.color(PALETTE[17]));
    Ok(())
}

#[test]
fn controller_reads_follow_live_state() -> Result<()> {
    let mut ppu = Ppu::new();
    let state = ppu.controller_state();
    for button in [Button::A, Button::Select, Button::Up, Button::Left] {
        state.set(button, true);
    }

    ppu.write(Register::Controller1.offset(), 1)?;
    ppu.write(Register::Controller1.offset(), 0)?;
    let bits: Vec<u8> = (0..10).map(|_| ppu.read(Register::Controller1.offset())).collect();
    assert_eq!(bits, [1, 0, 1, 0, 1, 0, 1, 0, 1, 1]);

    state.set(Button::A, false);
    ppu.write(Register::Controller1.offset(), 1)?;
    assert_eq!(ppu.read(Register::Controller1.offset()), 0);
    state.set(Button::A, true);
    assert_eq!(ppu.read(Register::Controller1.offset()), 1, "strobed reads track bit 0");
    Ok(())
}

#[test]
fn scroll_write_aborts_with_unsupported_feature() {
    let mut ppu = Ppu::new();
    let err = ppu
        .write(Register::Scroll.offset(), 0x10)
        .expect_err("scroll is not modeled");
    assert!(err.is_unsupported_feature());
}

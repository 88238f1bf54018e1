//! Frame assembly: turns a [`FrameSnapshot`] into RGB pixels.
//!
//! Rendering is frame based. The background is drawn tile by tile from the
//! selected nametable, then sprites are painted over it. There is no scrolling,
//! no sprite-zero hit and no per-scanline sprite limit.

use core::fmt;

use tracing::error;

use crate::{
    error::Error,
    memory::{frame, vram},
    palette::{Palette, Rgb},
    pattern::{PatternTable, Tile},
    ppu::{FrameSnapshot, Sprite},
};

/// Bytes per RGB pixel.
pub const BYTES_PER_PIXEL: usize = 3;
/// Size of a full frame in bytes.
pub const FRAME_BYTES: usize = frame::WIDTH * frame::HEIGHT * BYTES_PER_PIXEL;

const TILE_SIZE: usize = 8;
/// Tiles covered by one attribute byte, per axis.
const ATTRIBUTE_GROUP: usize = 4;
const ATTRIBUTE_ROW_BYTES: usize = frame::TILE_COLUMNS / ATTRIBUTE_GROUP;
const COLORS_PER_GROUP: usize = 4;

/// Packed 256x240 RGB image, row-major, zero (black) initialized.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Box<[u8]>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &frame::WIDTH)
            .field("height", &frame::HEIGHT)
            .finish_non_exhaustive()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; FRAME_BYTES].into_boxed_slice(),
        }
    }

    pub const fn width(&self) -> usize {
        frame::WIDTH
    }

    pub const fn height(&self) -> usize {
        frame::HEIGHT
    }

    /// Color at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        let offset = Self::offset(x, y)?;
        let px = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Some(Rgb::new(px[0], px[1], px[2]))
    }

    /// Writes one pixel. Coordinates outside the frame are dropped.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if let Some(offset) = Self::offset(x, y) {
            self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    /// Raw RGB bytes, `FRAME_BYTES` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn offset(x: usize, y: usize) -> Option<usize> {
        (x < frame::WIDTH && y < frame::HEIGHT).then(|| (y * frame::WIDTH + x) * BYTES_PER_PIXEL)
    }
}

/// Renders `snapshot` into a fresh frame buffer.
///
/// Fails when the snapshot asks for 8x16 sprites or when the pattern source
/// reports an unsupported request.
pub fn assemble(
    snapshot: &FrameSnapshot,
    patterns: &dyn PatternTable,
    palette: &Palette,
) -> Result<FrameBuffer, Error> {
    let mut buffer = FrameBuffer::new();
    draw_background(&mut buffer, snapshot, patterns, palette)?;
    draw_sprites(&mut buffer, snapshot, patterns, palette)?;
    Ok(buffer)
}

/// Palette group (0..=3) of the background tile at grid cell `(col, row)`.
fn attribute_group(nametable: &[u8], col: usize, row: usize) -> u8 {
    let index = vram::ATTRIBUTE_TABLE_OFFSET
        + (row / ATTRIBUTE_GROUP) * ATTRIBUTE_ROW_BYTES
        + col / ATTRIBUTE_GROUP;
    let mut shift = 0;
    if row % ATTRIBUTE_GROUP > 1 {
        shift += 4;
    }
    if col % ATTRIBUTE_GROUP > 1 {
        shift += 2;
    }
    (nametable[index] >> shift) & 0b11
}

fn draw_background(
    buffer: &mut FrameBuffer,
    snapshot: &FrameSnapshot,
    patterns: &dyn PatternTable,
    palette: &Palette,
) -> Result<(), Error> {
    let nametable = snapshot.nametable();
    for row in 0..frame::TILE_ROWS {
        for col in 0..frame::TILE_COLUMNS {
            let tile_index = nametable[row * frame::TILE_COLUMNS + col];
            let tile = patterns.tile(tile_index, snapshot.background_table(), false)?;
            let group = attribute_group(&nametable[..], col, row);
            paint_tile(
                buffer,
                &tile,
                snapshot,
                palette,
                group,
                (col * TILE_SIZE, row * TILE_SIZE),
                (false, false),
            );
        }
    }
    Ok(())
}

fn draw_sprites(
    buffer: &mut FrameBuffer,
    snapshot: &FrameSnapshot,
    patterns: &dyn PatternTable,
    palette: &Palette,
) -> Result<(), Error> {
    if snapshot.tall_sprites() {
        error!(frame = snapshot.frame(), "8x16 sprites requested");
        return Err(Error::TallSpritesUnsupported);
    }

    // Highest index first so entry 0 ends up on top.
    for sprite in snapshot.sprites().rev().filter(|sprite| !sprite.is_hidden()) {
        draw_sprite(buffer, &sprite, snapshot, patterns, palette)?;
    }
    Ok(())
}

fn draw_sprite(
    buffer: &mut FrameBuffer,
    sprite: &Sprite,
    snapshot: &FrameSnapshot,
    patterns: &dyn PatternTable,
    palette: &Palette,
) -> Result<(), Error> {
    let tile = patterns.tile(sprite.tile, snapshot.sprite_table(), false)?;
    paint_tile(
        buffer,
        &tile,
        snapshot,
        palette,
        sprite.palette_group(),
        (usize::from(sprite.x), usize::from(sprite.y)),
        (sprite.flip_horizontal(), sprite.flip_vertical()),
    );
    Ok(())
}

/// Paints the non-zero pixels of `tile` with palette `group` at `origin`.
fn paint_tile(
    buffer: &mut FrameBuffer,
    tile: &Tile,
    snapshot: &FrameSnapshot,
    palette: &Palette,
    group: u8,
    origin: (usize, usize),
    (flip_h, flip_v): (bool, bool),
) {
    let colors = snapshot.palette();
    for dy in 0..TILE_SIZE {
        let src_row = if flip_v { TILE_SIZE - 1 - dy } else { dy };
        for dx in 0..TILE_SIZE {
            let src_col = if flip_h { TILE_SIZE - 1 - dx } else { dx };
            let color_index = tile[src_row][src_col];
            if color_index == 0 {
                continue;
            }
            let slot = usize::from(group) * COLORS_PER_GROUP + usize::from(color_index);
            let Some(rgb) = colors.get(slot).and_then(|&hw| palette.color(hw)) else {
                continue;
            };
            buffer.set_pixel(origin.0 + dx, origin.1 + dy, rgb);
        }
    }
}

use famiview_core::{
    FrameBuffer,
    memory::frame::{HEIGHT, WIDTH},
};
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// Draws a frame with half-block cells: each terminal cell shows two
/// vertically stacked pixels, scaled to fit while keeping the aspect ratio.
pub struct FrameWidget<'a> {
    frame: &'a FrameBuffer,
}

impl<'a> FrameWidget<'a> {
    pub fn new(frame: &'a FrameBuffer) -> Self {
        Self { frame }
    }
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        const FRAME_W: f64 = WIDTH as f64;
        const FRAME_H: f64 = HEIGHT as f64;

        let term_w = area.width as f64;
        let term_h = area.height as f64;
        if term_w == 0.0 || term_h == 0.0 {
            return;
        }

        // Two vertical subpixels per character cell.
        let canvas_h = term_h * 2.0;
        let scale = (term_w / FRAME_W).min(canvas_h / FRAME_H);
        let off_x = (term_w - FRAME_W * scale) / 2.0;
        let off_y = (canvas_h - FRAME_H * scale) / 2.0;

        for y in 0..area.height {
            for x in 0..area.width {
                let vx = x as f64;
                let top = self.sample(vx, (y * 2) as f64, off_x, off_y, scale);
                let bottom = self.sample(vx, (y * 2 + 1) as f64, off_x, off_y, scale);

                buf.get_mut(area.left() + x, area.top() + y)
                    .set_char('▀')
                    .set_fg(top)
                    .set_bg(bottom);
            }
        }
    }
}

impl FrameWidget<'_> {
    fn sample(&self, vx: f64, vy: f64, off_x: f64, off_y: f64, scale: f64) -> Color {
        let nx = (vx - off_x) / scale;
        let ny = (vy - off_y) / scale;
        if nx < 0.0 || ny < 0.0 {
            return Color::Black;
        }
        match self.frame.pixel(nx as usize, ny as usize) {
            Some(rgb) => Color::Rgb(rgb.r, rgb.g, rgb.b),
            None => Color::Black,
        }
    }
}

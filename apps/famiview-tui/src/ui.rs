mod widget;

use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

use famiview_core::FrameBuffer;
use famiview_runtime::DisplaySink;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracing::warn;

use self::widget::FrameWidget;

/// Header line contents.
pub struct Status<'a> {
    pub rom_name: &'a str,
    pub frames: u64,
    pub fps: u32,
}

pub fn draw(f: &mut Frame, frame: &FrameBuffer, status: &Status<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Picture
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    let title = Line::from(vec![
        Span::styled(
            " famiview ",
            Style::default().bg(Color::Blue).fg(Color::White).bold(),
        ),
        Span::raw(format!(
            " | ROM: {} | Frame: {} | FPS: {}",
            status.rom_name, status.frames, status.fps
        )),
    ]);
    f.render_widget(Paragraph::new(title).alignment(Alignment::Center), chunks[0]);

    f.render_widget(FrameWidget::new(frame), chunks[1]);

    let help = Line::from(vec![
        Span::styled("Q/Esc", Style::default().bold()),
        Span::raw(": Quit | "),
        Span::styled("R", Style::default().bold()),
        Span::raw(": Reset | "),
        Span::styled("WASD", Style::default().bold()),
        Span::raw(": D-Pad | "),
        Span::styled("P/O", Style::default().bold()),
        Span::raw(": A/B | "),
        Span::styled("B/N", Style::default().bold()),
        Span::raw(": Sel/Start"),
    ]);
    f.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .bg(Color::DarkGray),
        chunks[2],
    );
}

/// Display sink drawing every presented frame straight to the terminal.
pub struct TerminalSink {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    rom_name: String,
    frames: u64,
    fps_counter: u32,
    last_fps_time: Instant,
    current_fps: u32,
}

impl TerminalSink {
    pub fn new(rom_name: String) -> io::Result<Self> {
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            terminal,
            rom_name,
            frames: 0,
            fps_counter: 0,
            last_fps_time: Instant::now(),
            current_fps: 0,
        })
    }
}

impl DisplaySink for TerminalSink {
    fn present(&mut self, frame: &FrameBuffer) {
        self.frames += 1;
        self.fps_counter += 1;
        if self.last_fps_time.elapsed() >= Duration::from_secs(1) {
            self.current_fps = self.fps_counter;
            self.fps_counter = 0;
            self.last_fps_time = Instant::now();
        }

        let status = Status {
            rom_name: &self.rom_name,
            frames: self.frames,
            fps: self.current_fps,
        };
        if let Err(err) = self.terminal.draw(|f| draw(f, frame, &status)) {
            warn!(%err, "terminal draw failed");
        }
    }
}

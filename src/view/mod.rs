//! Shared terminal plumbing for the two interactive views (spec.md §4.G/§4.H).
//!
//! Grounded on skim's `tui/backend.rs` `Tui<B: Backend>` RAII wrapper: raw
//! mode (and, for the full-screen view, the alternate screen) is entered on
//! construction and restored on every exit path, mirroring
//! `Tui::enter`/`Tui::exit`/`Drop for Tui` and `set_panic_hook`. Unlike skim
//! we drive a synchronous `crossterm::event::read()` loop rather than a
//! background tokio task: spec.md §5's concurrency model is single-threaded
//! and blocks on input, so there is no event channel to bridge.

pub mod fullscreen;
pub mod list;

use std::io;
use std::sync::Once;

use crossterm::cursor;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Widget};

use crate::{Color, NamedColor, Style};

static PANIC_HOOK_SET: Once = Once::new();

/// RAII terminal handle used by both views.
///
/// The full-screen view takes the alternate screen; the list view draws
/// inline below the caller's cursor (spec.md §4.H) via ratatui's
/// `Viewport::Inline` and never takes it.
pub struct Tui<B: Backend = CrosstermBackend<io::Stderr>> {
    /// The wrapped ratatui terminal
    pub terminal: ratatui::Terminal<B>,
    alt_screen: bool,
    entered: bool,
}

impl Tui<CrosstermBackend<io::Stderr>> {
    /// A full-screen session: alternate screen, hidden cursor.
    pub fn fullscreen() -> io::Result<Self> {
        Self::with_viewport(CrosstermBackend::new(io::stderr()), ratatui::Viewport::Fullscreen, true)
    }

    /// An inline session drawing `height` rows below the caller's cursor
    /// (spec.md §4.H: one prompt line plus up to `maxVisibleItems` results).
    pub fn inline(height: u16) -> io::Result<Self> {
        Self::with_viewport(CrosstermBackend::new(io::stderr()), ratatui::Viewport::Inline(height), false)
    }
}

impl<B: Backend> Tui<B> {
    /// Wraps an already-constructed backend with an explicit viewport.
    pub fn with_viewport(backend: B, viewport: ratatui::Viewport, alt_screen: bool) -> io::Result<Self> {
        set_panic_hook();
        let terminal = ratatui::Terminal::with_options(backend, ratatui::TerminalOptions { viewport })?;
        Ok(Self { terminal, alt_screen, entered: false })
    }

    /// Enters raw mode, and the alternate screen + hidden cursor if this is
    /// a full-screen session. Idempotent.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        crossterm::terminal::enable_raw_mode()?;
        if self.alt_screen {
            crossterm::execute!(io::stderr(), EnterAlternateScreen, cursor::Hide)?;
        }
        self.entered = true;
        Ok(())
    }

    /// Restores the terminal to its pre-`enter` state. Idempotent, and safe
    /// to call after a prior error (spec.md §7 `IoError`: "cleanup MUST
    /// restore terminal").
    pub fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        if self.alt_screen {
            crossterm::execute!(io::stderr(), LeaveAlternateScreen, cursor::Show)?;
        }
        if crossterm::terminal::is_raw_mode_enabled()? {
            crossterm::terminal::disable_raw_mode()?;
        }
        self.entered = false;
        Ok(())
    }
}

impl<B: Backend> Drop for Tui<B> {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

fn set_panic_hook() {
    PANIC_HOOK_SET.call_once(|| {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = crossterm::execute!(io::stderr(), LeaveAlternateScreen, cursor::Show);
            hook(info);
        }));
    });
}

/// A 2-D grid of `(rune, style)`, sized to the terminal (spec.md §4.G).
///
/// Writes wrap by column-modulo at paint time rather than at write time:
/// [`TextBuffer::put`] takes an absolute column `x` on a logical `line` and
/// wraps into subsequent rows every `width` columns, so callers never need
/// to pre-compute wrapped positions.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    width: usize,
    height: usize,
    cells: Vec<(char, Style)>,
}

impl TextBuffer {
    /// Allocates a blank buffer of the given size (minimum 1x1).
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self { width, height, cells: vec![(' ', Style::default()); width * height] }
    }

    /// Current width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Current height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Re-allocates the buffer to a new size, discarding prior contents
    /// (spec.md §4.G "window resize: re-allocate TextBuffer to new size").
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Writes a plain line starting at row `line`, column 0, wrapping as
    /// needed. Existing styling at overwritten cells is replaced with the
    /// default style.
    pub fn put_line(&mut self, line: usize, text: &str) {
        for (x, ch) in text.chars().enumerate() {
            self.put(line, x, ch, Style::default());
        }
    }

    /// Writes a single styled rune at absolute column `x` of logical `line`.
    /// Out-of-bounds rows (past the buffer's height) are silently dropped.
    pub fn put(&mut self, line: usize, x: usize, ch: char, style: Style) {
        if self.width == 0 {
            return;
        }
        let row = line + x / self.width;
        let col = x % self.width;
        if row < self.height {
            let idx = self.index(col, row);
            self.cells[idx] = (ch, style);
        }
    }

    /// Reads back the rune and style at an absolute `(x, y)` cell.
    pub fn get(&self, x: usize, y: usize) -> (char, Style) {
        self.cells[self.index(x, y)]
    }

    /// Renders the buffer onto a ratatui frame via a [`Paragraph`], matching
    /// skim's widget-composition render style rather than poking
    /// `ratatui::buffer::Buffer` cells directly.
    pub fn render(&self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let lines: Vec<Line> = (0..self.height).map(|y| self.row_as_line(y)).collect();
        Paragraph::new(Text::from(lines)).render(area, buf);
    }

    fn row_as_line(&self, y: usize) -> Line<'static> {
        let mut spans = Vec::new();
        let mut run = String::new();
        let mut run_style = None::<Style>;
        for x in 0..self.width {
            let (ch, style) = self.get(x, y);
            match run_style {
                Some(s) if s == style => run.push(ch),
                _ => {
                    if !run.is_empty() {
                        spans.push(styled_span(std::mem::take(&mut run), run_style.unwrap()));
                    }
                    run.push(ch);
                    run_style = Some(style);
                }
            }
        }
        if !run.is_empty() {
            spans.push(styled_span(run, run_style.unwrap_or_default()));
        }
        Line::from(spans)
    }
}

fn styled_span(text: String, style: Style) -> Span<'static> {
    Span::styled(text, to_ratatui_style(style))
}

/// Converts the crate's [`Style`] to a `ratatui::style::Style`, the reverse
/// of [`crate::ansi::parse`]'s direction.
pub(crate) fn to_ratatui_style(style: Style) -> ratatui::style::Style {
    let mut out = ratatui::style::Style::default();
    if let Some(fg) = style.fg {
        out = out.fg(to_ratatui_color(fg));
    }
    if let Some(bg) = style.bg {
        out = out.bg(to_ratatui_color(bg));
    }
    if style.bold {
        out = out.add_modifier(ratatui::style::Modifier::BOLD);
    }
    if style.underline {
        out = out.add_modifier(ratatui::style::Modifier::UNDERLINED);
    }
    if style.italic {
        out = out.add_modifier(ratatui::style::Modifier::ITALIC);
    }
    out
}

pub(crate) fn to_ratatui_color(color: Color) -> ratatui::style::Color {
    match color {
        Color::TrueColor(r, g, b) => ratatui::style::Color::Rgb(r, g, b),
        Color::NamedPalette(NamedColor::Default) => ratatui::style::Color::Reset,
        Color::NamedPalette(NamedColor::Black) => ratatui::style::Color::Black,
        Color::NamedPalette(NamedColor::Red) => ratatui::style::Color::Red,
        Color::NamedPalette(NamedColor::Green) => ratatui::style::Color::Green,
        Color::NamedPalette(NamedColor::Yellow) => ratatui::style::Color::Yellow,
        Color::NamedPalette(NamedColor::Blue) => ratatui::style::Color::Blue,
        Color::NamedPalette(NamedColor::Magenta) => ratatui::style::Color::Magenta,
        Color::NamedPalette(NamedColor::Cyan) => ratatui::style::Color::Cyan,
        Color::NamedPalette(NamedColor::White) => ratatui::style::Color::White,
    }
}

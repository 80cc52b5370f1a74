//! Full-screen hint overlay view (spec.md §4.G).
//!
//! Grounded on skim's `tui/app.rs` event loop shape (poll a key, mutate
//! state, re-render) and `tui/backend.rs`'s `Tui` RAII wrapper, adapted to
//! this spec's state machine: keys move a `skip` cursor over the match list
//! or type a hint directly, and either produces a `HintEvent` (return the
//! chosen matches) or an `ExitEvent` (return nothing).

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Tui, TextBuffer};
use crate::{ChosenMatch, Match, Style};

/// Where the hint label is painted relative to its match (spec.md §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Overlay the first columns of the match
    Left,
    /// Overlay the last columns of the match
    Right,
    /// Paint just before the match, without overlapping it
    OffLeft,
    /// Paint just after the match, without overlapping it
    OffRight,
}

impl Default for Position {
    fn default() -> Self {
        Self::Left
    }
}

/// The four configurable color roles (spec.md §6.3 `[colors]`).
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// Style for an unselected match's own text
    pub match_style: Style,
    /// Style for a hint label overlay
    pub hint_style: Style,
    /// Style for matches already in `chosen` (multi-select mode)
    pub multi_style: Style,
    /// Style for the match currently under the `skip` cursor
    pub select_style: Style,
}

impl Default for ColorScheme {
    fn default() -> Self {
        use crate::{Color, NamedColor};
        let on_black = |fg: NamedColor| Style { fg: Some(Color::NamedPalette(fg)), bg: Some(Color::NamedPalette(NamedColor::Black)), ..Style::default() };
        Self {
            match_style: on_black(NamedColor::Green),
            hint_style: on_black(NamedColor::Yellow),
            multi_style: on_black(NamedColor::Yellow),
            select_style: on_black(NamedColor::Blue),
        }
    }
}

/// Static configuration for a full-screen session.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullscreenConfig {
    /// Hint placement relative to its match
    pub position: Position,
    /// Wrap hint labels in `[` `]`
    pub contrast: bool,
    /// The four color roles
    pub colors: ColorScheme,
}

/// Outcome of a single key press (spec.md §4.G input handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    Hint,
    Exit,
}

struct State {
    matches: Vec<Match>,
    skip: usize,
    multi: bool,
    typed: String,
    has_uppercase: bool,
    longest_hint: usize,
    chosen: Vec<ChosenMatch>,
}

impl State {
    fn new(matches: Vec<Match>) -> Self {
        let longest_hint = matches.iter().filter_map(|m| m.hint.as_ref()).map(|h| h.chars().count()).max().unwrap_or(0);
        State { matches, skip: 0, multi: false, typed: String::new(), has_uppercase: false, longest_hint, chosen: Vec::new() }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Outcome {
        match code {
            KeyCode::Esc => return self.handle_escape(),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return self.handle_escape(),
            KeyCode::Up | KeyCode::Left => {
                self.skip = self.skip.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Right => {
                if !self.matches.is_empty() {
                    self.skip = (self.skip + 1).min(self.matches.len() - 1);
                }
            }
            KeyCode::Backspace => {
                self.typed.pop();
            }
            KeyCode::Enter => {
                if let Some(m) = self.matches.get(self.skip) {
                    self.chosen.push(ChosenMatch { text: m.text.clone(), uppercase: false, should_open_file: false });
                }
                if !self.multi {
                    return Outcome::Hint;
                }
            }
            KeyCode::Char(' ') => {
                if self.multi {
                    return Outcome::Hint;
                }
                self.multi = true;
            }
            KeyCode::Char(ch) => return self.handle_printable(ch),
            _ => {}
        }
        Outcome::Continue
    }

    fn handle_escape(&mut self) -> Outcome {
        if self.multi && !self.typed.is_empty() {
            self.typed.clear();
            Outcome::Continue
        } else {
            Outcome::Exit
        }
    }

    fn handle_printable(&mut self, ch: char) -> Outcome {
        self.has_uppercase = ch.is_uppercase();
        self.typed.push(ch.to_ascii_lowercase());

        let matched: Vec<usize> =
            self.matches.iter().enumerate().filter(|(_, m)| m.hint.as_deref() == Some(self.typed.as_str())).map(|(i, _)| i).collect();

        if !matched.is_empty() {
            for i in matched {
                let m = &self.matches[i];
                self.chosen.push(ChosenMatch { text: m.text.clone(), uppercase: self.has_uppercase, should_open_file: self.has_uppercase });
            }
            if !self.multi {
                return Outcome::Hint;
            }
            self.typed.clear();
            return Outcome::Continue;
        }

        if !self.multi && self.typed.chars().count() >= self.longest_hint {
            return Outcome::Exit;
        }
        Outcome::Continue
    }
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn render_buffer(lines: &[String], state: &State, config: &FullscreenConfig) -> TextBuffer {
    let width = lines.iter().map(|l| display_width(l)).max().unwrap_or(0).max(1);
    let height = lines.len().max(1);
    let mut buf = TextBuffer::new(width, height);
    for (y, line) in lines.iter().enumerate() {
        buf.put_line(y, line);
    }

    for (i, m) in state.matches.iter().enumerate() {
        let Some(line) = lines.get(m.y) else { continue };
        let prefix_width = display_width(&line[..m.x.min(line.len())]);
        let match_width = display_width(&m.text);

        let style = if state.chosen.iter().any(|c| c.text == m.text) {
            config.colors.multi_style
        } else if i == state.skip {
            config.colors.select_style
        } else {
            config.colors.match_style
        };

        let mut col = prefix_width;
        for ch in m.text.chars() {
            buf.put(m.y, col, ch, style);
            col += UnicodeWidthChar::width(ch).unwrap_or(0);
        }

        if let Some(hint) = &m.hint {
            let label = if config.contrast { format!("[{hint}]") } else { hint.clone() };
            paint_hint(&mut buf, m.y, prefix_width, match_width, &label, config.position, config.colors.hint_style);
        }
    }
    buf
}

fn paint_hint(buf: &mut TextBuffer, line: usize, prefix_width: usize, match_width: usize, label: &str, position: Position, style: Style) {
    let label_width = display_width(label);
    let start = match position {
        Position::Left => prefix_width,
        Position::Right => prefix_width + match_width.saturating_sub(label_width),
        Position::OffLeft => prefix_width.saturating_sub(label_width),
        Position::OffRight => prefix_width + match_width,
    };
    let mut col = start;
    for ch in label.chars() {
        buf.put(line, col, ch, style);
        col += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
}

/// Runs the full-screen session to completion, returning the chosen
/// matches (empty on `ExitEvent`, per spec.md §4.G).
pub fn present(lines: &[String], matches: Vec<Match>, config: FullscreenConfig) -> io::Result<Vec<ChosenMatch>> {
    let mut tui = Tui::fullscreen()?;
    tui.enter()?;
    let result = run(&mut tui, lines, matches, config);
    tui.exit()?;
    result
}

fn run<B: ratatui::backend::Backend>(
    tui: &mut Tui<B>,
    lines: &[String],
    matches: Vec<Match>,
    config: FullscreenConfig,
) -> io::Result<Vec<ChosenMatch>> {
    let mut state = State::new(matches);
    loop {
        let buffer = render_buffer(lines, &state, &config);
        tui.terminal.draw(|frame| buffer.render(frame.area(), frame.buffer_mut()))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match state.handle_key(key.code, key.modifiers) {
                Outcome::Continue => {}
                Outcome::Hint => return Ok(state.chosen),
                Outcome::Exit => return Ok(Vec::new()),
            },
            Event::Resize(w, h) => {
                let _ = (w, h); // next draw re-measures `lines`; the buffer itself is rebuilt every frame
            }
            _ => {}
        }
    }
}

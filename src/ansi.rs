//! ANSI style extractor (spec.md §4.C).
//!
//! Splits a raw captured string into plain lines plus positioned
//! [`StyleSpan`]s. Grounded on skim's own use of the `ansi-to-tui` crate
//! (`helper/item.rs::display`, `tui/preview.rs`): we drive `IntoText` per
//! line and flatten its spans, the same "parse to `ratatui::text::Text`,
//! walk `line.spans`" shape skim uses when it needs styled fragments out of
//! ANSI bytes.

use ansi_to_tui::IntoText;
use ratatui::style::{Color as RColor, Modifier};

use crate::{Color, NamedColor, Style, StyleSpan};

/// The result of splitting raw input into plain text and styled spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedText {
    /// The plain (ANSI-stripped) lines of the input
    pub lines: Vec<String>,
    /// Positioned styled spans, byte-indexed into `lines`
    pub spans: Vec<StyleSpan>,
}

/// Splits `input` into plain lines and styled spans.
///
/// If `input` contains no ESC (`0x1B`) or `0x9B` byte, the no-op fast path is
/// taken: lines are returned as-is with an empty span list. Otherwise each
/// line is fed to the ANSI parser; if parsing a line fails, that line
/// degrades to a single unstyled fragment and a `warn!` is logged
/// (spec.md §4.C, §7 `StyleParseError`).
pub fn parse(input: &str) -> ParsedText {
    if !needs_ansi_parsing(input) {
        return ParsedText { lines: input.split('\n').map(str::to_string).collect(), spans: Vec::new() };
    }

    let mut lines = Vec::new();
    let mut spans = Vec::new();

    for (line_no, raw_line) in input.split('\n').enumerate() {
        let plain = match parse_line(raw_line, line_no) {
            Ok((plain, mut line_spans)) => {
                spans.append(&mut line_spans);
                plain
            }
            Err(e) => {
                warn!("ansi: failed to parse line {line_no}, falling back to plain text: {e}");
                strip_ansi_bytes(raw_line)
            }
        };
        lines.push(plain);
    }

    ParsedText { lines, spans }
}

fn needs_ansi_parsing(input: &str) -> bool {
    memchr::memchr2(0x1B, 0x9B, input.as_bytes()).is_some()
}

fn parse_line(raw_line: &str, line_no: usize) -> Result<(String, Vec<StyleSpan>), ansi_to_tui::Error> {
    let parsed = raw_line.as_bytes().to_vec().into_text()?;

    let mut plain = String::new();
    let mut spans = Vec::new();
    for rline in parsed.lines {
        for span in rline.spans {
            let start_col = plain.len();
            plain.push_str(&span.content);
            let end_col = plain.len();
            let style = convert_style(span.style);
            if style.is_styled() {
                spans.push(StyleSpan {
                    text: span.content.to_string(),
                    start_line: line_no,
                    start_col,
                    end_line: line_no,
                    end_col,
                    style,
                });
            }
        }
    }
    Ok((plain, spans))
}

fn convert_style(style: ratatui::style::Style) -> Style {
    Style {
        fg: style.fg.and_then(convert_color),
        bg: style.bg.and_then(convert_color),
        bold: style.add_modifier.contains(Modifier::BOLD),
        underline: style.add_modifier.contains(Modifier::UNDERLINED),
        italic: style.add_modifier.contains(Modifier::ITALIC),
    }
}

fn convert_color(color: RColor) -> Option<Color> {
    Some(match color {
        RColor::Reset => return None,
        RColor::Black => Color::NamedPalette(NamedColor::Black),
        RColor::Red | RColor::LightRed => Color::NamedPalette(NamedColor::Red),
        RColor::Green | RColor::LightGreen => Color::NamedPalette(NamedColor::Green),
        RColor::Yellow | RColor::LightYellow => Color::NamedPalette(NamedColor::Yellow),
        RColor::Blue | RColor::LightBlue => Color::NamedPalette(NamedColor::Blue),
        RColor::Magenta | RColor::LightMagenta => Color::NamedPalette(NamedColor::Magenta),
        RColor::Cyan | RColor::LightCyan => Color::NamedPalette(NamedColor::Cyan),
        RColor::White | RColor::Gray | RColor::DarkGray => Color::NamedPalette(NamedColor::White),
        RColor::Rgb(r, g, b) => Color::TrueColor(r, g, b),
        // 256-color indexed palette has no lossless mapping onto the nine
        // named colors; approximate as the terminal default rather than
        // guessing a named color (see DESIGN.md).
        RColor::Indexed(_) => Color::NamedPalette(NamedColor::Default),
    })
}

/// Strips ANSI CSI/OSC escape sequences from `line`, used as the
/// line-parse-failure fallback here and by [`crate::ps1`]'s `ignore_colors`
/// preprocessing.
pub(crate) fn strip_ansi_bytes(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1B && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            let mut j = i + 2;
            while j < bytes.len() && !(0x40..=0x7E).contains(&bytes[j]) {
                j += 1;
            }
            i = (j + 1).min(bytes.len());
        } else {
            // Safe because we only skip over ASCII escape bytes above; any
            // other byte is copied through raw-string-wise via char boundary scan.
            let ch_len = line[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&line[i..i + ch_len]);
            i += ch_len;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_input_takes_no_op_path() {
        let parsed = parse("hello\nworld");
        assert_eq!(parsed.lines, vec!["hello", "world"]);
        assert!(parsed.spans.is_empty());
    }

    #[test]
    fn styled_input_produces_spans_with_plain_text() {
        let input = "plain \x1b[1;31mred bold\x1b[0m tail";
        let parsed = parse(input);
        assert_eq!(parsed.lines.len(), 1);
        assert_eq!(parsed.lines[0], "plain red bold tail");
        assert_eq!(parsed.spans.len(), 1);
        let span = &parsed.spans[0];
        assert_eq!(span.text, "red bold");
        assert!(span.style.bold);
        assert_eq!(span.style.fg, Some(Color::NamedPalette(NamedColor::Red)));
        assert_eq!(&parsed.lines[0][span.start_col..span.end_col], "red bold");
    }

    #[test]
    fn multiple_lines_preserve_independent_coordinates() {
        let input = "\x1b[32mline0\x1b[0m\nline1\n\x1b[1mline2\x1b[0m";
        let parsed = parse(input);
        assert_eq!(parsed.lines, vec!["line0", "line1", "line2"]);
        assert_eq!(parsed.spans.iter().filter(|s| s.start_line == 0).count(), 1);
        assert_eq!(parsed.spans.iter().filter(|s| s.start_line == 2).count(), 1);
        assert!(parsed.spans.iter().all(|s| s.start_line == s.end_line));
    }

    #[test]
    fn strip_ansi_bytes_removes_csi_sequences() {
        assert_eq!(strip_ansi_bytes("\x1b[1;31mhi\x1b[0m"), "hi");
    }
}

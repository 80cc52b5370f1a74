//! magonote is the match engine behind an interactive terminal picker.
//!
//! Given a captured block of (possibly ANSI-styled) terminal output, it finds
//! interesting substrings -- URLs, paths, IPs, hashes, aligned table cells,
//! colored words -- overlays short keyboard "hints" on them, and lets an
//! outer view (full-screen or a fuzzy-filtered list) collect a selection.
//!
//! The crate is organized the way the pipeline runs:
//!
//! 1. [`ansi`] splits raw input into plain lines and positioned styled spans.
//! 2. [`ps1`] turns a prompt template into a regex and locates prompts in text.
//! 3. [`table`] discovers aligned grids of cells in free-form text.
//! 4. [`engine`] runs the regex battery, merges in style/table matches, applies
//!    filters, deduplicates and assigns hints via [`alphabet`].
//! 5. [`fuzzy`] ranks candidates for the list view's incremental query.
//! 6. [`view`] renders either the full-screen overlay or the fuzzy list and
//!    collects the user's [`ChosenMatch`]es.
//!
//! ```no_run
//! use magonote::engine::{MatchEngine, EngineConfig};
//!
//! let text = "visit https://example.com/path for more\n";
//! let engine = MatchEngine::new(text, EngineConfig::default());
//! let matches = engine.matches(false, 0);
//! assert_eq!(matches[0].text, "https://example.com/path");
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

pub mod alphabet;
pub mod ansi;
pub mod cache;
#[cfg(feature = "cli")]
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
#[cfg(feature = "cli")]
pub mod logging;
pub mod ps1;
pub mod table;
pub mod view;

use std::fmt;

//------------------------------------------------------------------------------
// Data model (spec.md §3)

/// The nine named terminal colors, plus the terminal's default color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    /// Terminal default foreground/background
    Default,
    /// ANSI black
    Black,
    /// ANSI red
    Red,
    /// ANSI green
    Green,
    /// ANSI yellow
    Yellow,
    /// ANSI blue
    Blue,
    /// ANSI magenta
    Magenta,
    /// ANSI cyan
    Cyan,
    /// ANSI white
    White,
}

impl NamedColor {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "default" => Self::Default,
            "black" => Self::Black,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "white" => Self::White,
            _ => return None,
        })
    }
}

/// A color, either one of the nine named palette entries or a 24-bit RGB value.
///
/// Parsed from `"red"|"green"|...|"default"` or `"#RRGGBB"`. Any other string
/// is a fatal [`error::ConfigError::UnknownColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the nine named palette colors
    NamedPalette(NamedColor),
    /// A 24-bit RGB color
    TrueColor(u8, u8, u8),
}

impl Color {
    /// Parses a color spec, using the process-wide color cache.
    ///
    /// # Errors
    ///
    /// Returns [`error::ConfigError::UnknownColor`] if `spec` is neither a
    /// known named color nor a well-formed `#RRGGBB` hex triplet.
    pub fn parse(spec: &str) -> Result<Self, error::ConfigError> {
        crate::cache::cached_color(spec)
    }

    pub(crate) fn parse_uncached(spec: &str) -> Result<Self, error::ConfigError> {
        if let Some(hex) = spec.strip_prefix('#') {
            if hex.len() == 6 {
                let r = u8::from_str_radix(&hex[0..2], 16);
                let g = u8::from_str_radix(&hex[2..4], 16);
                let b = u8::from_str_radix(&hex[4..6], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (r, g, b) {
                    return Ok(Self::TrueColor(r, g, b));
                }
            }
            return Err(error::ConfigError::UnknownColor(spec.to_string()));
        }
        NamedColor::from_name(spec)
            .map(Self::NamedPalette)
            .ok_or_else(|| error::ConfigError::UnknownColor(spec.to_string()))
    }
}

/// A text style: foreground/background color plus boldness/underline/italic.
///
/// Two spans are considered "styled" (see [`Style::is_styled`]) iff any field
/// is non-default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    /// Foreground color, if set
    pub fg: Option<Color>,
    /// Background color, if set
    pub bg: Option<Color>,
    /// Bold attribute
    pub bold: bool,
    /// Underline attribute
    pub underline: bool,
    /// Italic attribute
    pub italic: bool,
}

impl Style {
    /// Returns true iff this style differs from the default (unstyled) style.
    pub fn is_styled(&self) -> bool {
        self.fg.is_some() || self.bg.is_some() || self.bold || self.underline || self.italic
    }
}

/// A contiguous run of input sharing a non-default [`Style`], with byte
/// coordinates into the *plain* (ANSI-stripped) line.
///
/// `end_col` is exclusive, expressed as a byte offset; [`ansi`] and
/// [`view`] widen to display columns (East-Asian width aware) only at
/// render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    /// The plain (unstyled) text of the span
    pub text: String,
    /// Starting line (0-based)
    pub start_line: usize,
    /// Starting byte column on `start_line`
    pub start_col: usize,
    /// Ending line (0-based); spans never cross lines in this implementation
    pub end_line: usize,
    /// Ending byte column on `end_line`, exclusive
    pub end_col: usize,
    /// The style shared by this whole run
    pub style: Style,
}

/// A positioned match: a pick candidate found by the [`engine`].
///
/// Invariant: `text` is a substring of `lines[y]` starting at byte offset
/// `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte column where the match starts on its line
    pub x: usize,
    /// Line index (0-based)
    pub y: usize,
    /// The tag of the pattern (or detector) that produced this match
    pub pattern: String,
    /// The matched text
    pub text: String,
    /// The hint label assigned to this match, if any
    pub hint: Option<String>,
}

impl Match {
    /// Exclusive end byte column of this match on its line.
    pub fn end_x(&self) -> usize {
        self.x + self.text.len()
    }

    /// Returns true iff `self` and `other` overlap per spec.md §4.F.3: their
    /// line ranges intersect, and on a shared line their half-open byte
    /// intervals `[x, x+len(text))` intersect.
    pub fn overlaps(&self, other: &Match) -> bool {
        if self.y != other.y {
            return false;
        }
        self.x < other.end_x() && other.x < self.end_x()
    }
}

/// The result of choosing a match: what the outer caller should do with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenMatch {
    /// The text of the chosen match
    pub text: String,
    /// Whether the user pressed the uppercase form of the hint
    pub uppercase: bool,
    /// Whether the uppercase selection means "open in `$EDITOR`" rather than emit
    pub should_open_file: bool,
}

/// Information about the tmux pane (or equivalent) a capture came from.
///
/// This is purely a boundary type: the core never reads tmux state itself,
/// an outer collaborator constructs it and may pass it through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneInfo {
    /// Pane identifier, e.g. `%3`
    pub id: String,
    /// Pane height in rows
    pub height: u16,
    /// Scroll position in the pane's history
    pub scroll_position: i64,
    /// Whether the pane is in copy mode
    pub in_mode: bool,
    /// Whether the pane is zoomed
    pub zoomed: bool,
}

/// A rectangular region used for overlap tests (exclusion zones, PS1 prompt
/// regions). Coordinates follow the same half-open convention as [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Starting line
    pub start_line: usize,
    /// Starting byte column on `start_line`
    pub start_col: usize,
    /// Ending line
    pub end_line: usize,
    /// Ending byte column on `end_line`, exclusive
    pub end_col: usize,
}

impl Region {
    /// Returns true iff `m` falls inside this region, using the same overlap
    /// rule as [`Match::overlaps`] (exclusion semantics are identical to
    /// match/match overlap, per spec.md §4.F.3).
    pub fn overlaps_match(&self, m: &Match) -> bool {
        if m.y < self.start_line || m.y > self.end_line {
            return false;
        }
        let region_start = if m.y == self.start_line { self.start_col } else { 0 };
        let region_end = if m.y == self.end_line { self.end_col } else { usize::MAX };
        m.x < region_end && region_start < m.end_x()
    }
}

/// A user-defined region (or shell-prompt region) to drop matches within.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    /// Whether `pattern` is a regex or a literal substring
    pub kind: ExclusionKind,
    /// The pattern text; an empty pattern is a no-op
    pub pattern: String,
}

/// Discriminates the two kinds of [`ExclusionRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionKind {
    /// `pattern` is a regular expression
    Regex,
    /// `pattern` is matched as a literal substring
    Text,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::NamedPalette(c) => write!(f, "{c:?}"),
            Color::TrueColor(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parse_named() {
        assert_eq!(Color::parse_uncached("red").unwrap(), Color::NamedPalette(NamedColor::Red));
        assert_eq!(Color::parse_uncached("default").unwrap(), Color::NamedPalette(NamedColor::Default));
    }

    #[test]
    fn color_parse_hex() {
        assert_eq!(Color::parse_uncached("#ff00aa").unwrap(), Color::TrueColor(0xff, 0x00, 0xaa));
    }

    #[test]
    fn color_parse_unknown_is_error() {
        assert!(Color::parse_uncached("chartreuse").is_err());
        assert!(Color::parse_uncached("#zzzzzz").is_err());
        assert!(Color::parse_uncached("#ffff").is_err());
    }

    #[test]
    fn style_is_styled() {
        assert!(!Style::default().is_styled());
        assert!(Style { bold: true, ..Default::default() }.is_styled());
        assert!(Style { fg: Some(Color::NamedPalette(NamedColor::Red)), ..Default::default() }.is_styled());
    }

    #[test]
    fn match_overlap_same_line() {
        let a = Match { x: 0, y: 0, pattern: "p".into(), text: "abcd".into(), hint: None };
        let b = Match { x: 3, y: 0, pattern: "p".into(), text: "de".into(), hint: None };
        let c = Match { x: 4, y: 0, pattern: "p".into(), text: "de".into(), hint: None };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn match_overlap_different_lines_never_overlap() {
        let a = Match { x: 0, y: 0, pattern: "p".into(), text: "abcd".into(), hint: None };
        let b = Match { x: 0, y: 1, pattern: "p".into(), text: "abcd".into(), hint: None };
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn region_overlaps_match_single_line() {
        let region = Region { start_line: 0, start_col: 5, end_line: 0, end_col: 10 };
        let inside = Match { x: 6, y: 0, pattern: "p".into(), text: "ab".into(), hint: None };
        let outside = Match { x: 20, y: 0, pattern: "p".into(), text: "ab".into(), hint: None };
        assert!(region.overlaps_match(&inside));
        assert!(!region.overlaps_match(&outside));
    }
}

//! PS1 tokenizer (spec.md §4.D.1).
//!
//! Streams through a zsh-style `PS1` template and emits exactly one
//! [`Token`] per position. Nested `%{…%}` / `%(…)` / `$(…)` / `${…}` are
//! matched by bracket counting, the same "track nesting depth while
//! scanning" approach skim's own `ansi_processor.rs` uses for CSI sequence
//! boundaries, generalized here to the PS1 grammar.

use crate::error::{Ps1ParseError, Ps1ParseErrorKind};

/// Which side of a `%F{…}`/`%K{…}` color sequence this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ground {
    /// `%F{color}`
    Foreground,
    /// `%K{color}`
    Background,
}

/// The body of a [`Token::ColorSeq`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorBody {
    /// `%{ … %}`: an opaque literal escape sequence body
    Raw(String),
    /// `%F{color}` / `%K{color}`
    Named { ground: Ground, color: String },
}

/// The fixed meaning table for bare `%X` escapes (spec.md §4.D.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PercentMeaning {
    /// `%n`
    Username,
    /// `%m`
    HostnameShort,
    /// `%M`
    HostnameFull,
    /// `%~`
    CurrentDirTilde,
    /// `%d` or `%/`
    CurrentDir,
    /// `%c` or `%.`
    CurrentDirTail,
    /// `%h` or `%!`
    HistoryNumber,
    /// `%T`
    Time24h,
    /// `%t` or `%@`
    Time12h,
    /// `%*`
    Time24hSeconds,
    /// `%w`
    DateDayDd,
    /// `%W`
    DateMmDdYy,
    /// `%D` (bare; `%D{fmt}` is [`PercentMeaning::DateFormat`])
    DateYyMmDd,
    /// `%#`
    PrivilegeIndicator,
    /// `%?`
    ExitStatus,
    /// `%j`
    JobCount,
    /// `%l`
    Tty,
    /// `%L`
    ShellLevel,
    /// `%_`
    ParserState,
    /// `%^`
    ParserStateReverse,
    /// `%B`
    StartBold,
    /// `%b`
    EndBold,
    /// `%U`
    StartUnderline,
    /// `%u`
    EndUnderline,
    /// `%S`
    StartStandout,
    /// `%s`
    EndStandout,
    /// `%F` (bare, no `{color}`)
    StartForegroundColor,
    /// `%f`
    EndForegroundColor,
    /// `%K` (bare, no `{color}`)
    StartBackgroundColor,
    /// `%k`
    EndBackgroundColor,
    /// `%E`
    TerminalClearEol,
    /// `%` followed by a literal space
    LiteralSpace,
    /// `%D{fmt}`
    DateFormat {
        /// The `strftime`-style format string
        format: String,
    },
    /// `%$NAME` or `%${NAME}`
    VariableReference {
        /// The referenced variable name
        name: String,
        /// Whether the braced form `%${NAME}` was used
        braced: bool,
    },
    /// `%N<…<…%esc` / `%N>…>…%esc` path truncation
    Truncated {
        /// Leading digit count, if present
        number: Option<u32>,
        /// `<` or `>`
        direction: char,
        /// The "dots" body between the two direction markers
        marker: String,
    },
    /// An unrecognized escape letter (lax mode only; strict mode errors)
    Unknown {
        /// The unrecognized letter
        letter: char,
    },
}

/// Which bracket delimits a [`Token::Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `$(…)` or `${…}` command/arithmetic substitution
    Substitution,
    /// `$NAME`
    Variable,
}

/// One tokenized unit of a PS1 template (spec.md §4.D.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, already unescaped
    Literal(String),
    /// `%{ … %}`, `%F{…}`, `%K{…}`
    ColorSeq(ColorBody),
    /// `%(test sep true_text sep false_text)`
    Condition {
        /// Leading digit count, if present
        number: Option<u32>,
        /// The test letter
        test: char,
        /// The separator character
        sep: char,
        /// Tokens for the true branch
        true_branch: Vec<Token>,
        /// Tokens for the false branch, empty if omitted
        false_branch: Vec<Token>,
    },
    /// A `%`-escape other than `ColorSeq`/`Condition`
    Percent {
        /// The escape's meaning
        meaning: PercentMeaning,
    },
    /// `$(…)`, `${…}`, `$NAME`
    Command {
        /// Which delimiter form this is
        kind: CommandKind,
        /// The raw body (without delimiters)
        body: String,
    },
}

struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
    strict: bool,
}

/// Tokenizes `input`. In strict mode, unclosed groups and unknown `%X`
/// escapes are errors; in lax mode they degrade to literal text / `Unknown`.
pub fn tokenize(input: &str, strict: bool) -> Result<Vec<Token>, Ps1ParseError> {
    let mut t = Tokenizer { bytes: input.as_bytes(), pos: 0, strict };
    t.tokenize_until(None)
}

impl<'a> Tokenizer<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn byte_at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    fn slice_str(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }

    /// Tokenizes until EOF, or until `stop` bytes are seen at depth 0
    /// (used for condition/command-substitution bodies that are consumed by
    /// the caller rather than by this loop).
    fn tokenize_until(&mut self, stop: Option<&[u8]>) -> Result<Vec<Token>, Ps1ParseError> {
        let mut tokens = Vec::new();
        let mut literal_start = self.pos;

        macro_rules! flush_literal {
            ($end:expr) => {
                if $end > literal_start {
                    let raw = self.slice_str(literal_start, $end);
                    tokens.push(Token::Literal(unescape(&raw)));
                }
            };
        }

        while let Some(b) = self.peek() {
            if let Some(stop_bytes) = stop {
                if stop_bytes.contains(&b) {
                    break;
                }
            }
            match b {
                b'%' => {
                    flush_literal!(self.pos);
                    let start = self.pos;
                    match self.read_percent()? {
                        Some(tok) => tokens.push(tok),
                        None => {
                            // Lax-mode unclosed group degraded to literal; `read_percent`
                            // already advanced `self.pos` past the consumed text.
                            tokens.push(Token::Literal(self.slice_str(start, self.pos)));
                        }
                    }
                    literal_start = self.pos;
                }
                b'$' => {
                    flush_literal!(self.pos);
                    tokens.push(self.read_dollar()?);
                    literal_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }
        flush_literal!(self.pos);
        Ok(tokens)
    }

    /// Reads one `%`-escape. Returns `Ok(None)` only for the lax-mode
    /// unclosed-group fallback (token already pushed as literal by caller).
    fn read_percent(&mut self) -> Result<Option<Token>, Ps1ParseError> {
        let error_pos = self.pos;
        self.pos += 1; // consume '%'

        match self.peek() {
            Some(b'{') => self.read_color_raw(error_pos),
            Some(b'(') => self.read_condition(error_pos).map(Some),
            Some(b'$') => self.read_percent_variable(),
            Some(b'F') | Some(b'K') if self.byte_at(self.pos + 1) == Some(b'{') => self.read_named_color(),
            Some(b'D') if self.byte_at(self.pos + 1) == Some(b'{') => self.read_date_format(),
            Some(c) if c.is_ascii_digit() || c == b'<' || c == b'>' => self.read_truncated_or_number(error_pos),
            Some(b' ') => {
                self.pos += 1;
                Ok(Some(Token::Percent { meaning: PercentMeaning::LiteralSpace }))
            }
            Some(c) => {
                self.pos += 1;
                match percent_meaning(c as char) {
                    Some(meaning) => Ok(Some(Token::Percent { meaning })),
                    None if self.strict => {
                        Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnknownEscape })
                    }
                    None => Ok(Some(Token::Percent { meaning: PercentMeaning::Unknown { letter: c as char } })),
                }
            }
            None => Ok(Some(Token::Literal("%".to_string()))),
        }
    }

    fn read_color_raw(&mut self, error_pos: usize) -> Result<Option<Token>, Ps1ParseError> {
        self.pos += 1; // consume '{'
        let mut depth = 1usize;
        let body_start = self.pos;
        loop {
            match (self.byte_at(self.pos), self.byte_at(self.pos + 1)) {
                (Some(b'%'), Some(b'{')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(b'%'), Some(b'}')) => {
                    depth -= 1;
                    if depth == 0 {
                        let body = self.slice_str(body_start, self.pos);
                        self.pos += 2;
                        return Ok(Some(Token::ColorSeq(ColorBody::Raw(body))));
                    }
                    self.pos += 2;
                }
                (Some(_), _) => self.pos += 1,
                (None, _) => {
                    if self.strict {
                        return Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedColor });
                    }
                    return Ok(None);
                }
            }
        }
    }

    fn read_named_color(&mut self) -> Result<Option<Token>, Ps1ParseError> {
        let ground = if self.peek() == Some(b'F') { Ground::Foreground } else { Ground::Background };
        let error_pos = self.pos - 1;
        self.pos += 2; // consume 'F'/'K' and '{'
        let start = self.pos;
        match self.bytes[self.pos..].iter().position(|&b| b == b'}') {
            Some(rel) => {
                let color = self.slice_str(start, start + rel);
                self.pos = start + rel + 1;
                Ok(Some(Token::ColorSeq(ColorBody::Named { ground, color })))
            }
            None if self.strict => {
                Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedColor })
            }
            None => Ok(None),
        }
    }

    fn read_date_format(&mut self) -> Result<Option<Token>, Ps1ParseError> {
        let error_pos = self.pos - 1;
        self.pos += 2; // consume 'D' and '{'
        let start = self.pos;
        match self.bytes[self.pos..].iter().position(|&b| b == b'}') {
            Some(rel) => {
                let format = self.slice_str(start, start + rel);
                self.pos = start + rel + 1;
                Ok(Some(Token::Percent { meaning: PercentMeaning::DateFormat { format } }))
            }
            None if self.strict => {
                Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedColor })
            }
            None => Ok(None),
        }
    }

    fn read_percent_variable(&mut self) -> Result<Option<Token>, Ps1ParseError> {
        self.pos += 1; // consume '$'
        let braced = self.peek() == Some(b'{');
        if braced {
            self.pos += 1;
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let name = self.slice_str(start, self.pos);
        if braced {
            if self.peek() == Some(b'}') {
                self.pos += 1;
            }
        }
        Ok(Some(Token::Percent { meaning: PercentMeaning::VariableReference { name, braced } }))
    }

    fn read_truncated_or_number(&mut self, error_pos: usize) -> Result<Option<Token>, Ps1ParseError> {
        let num_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let number = if self.pos > num_start { self.slice_str(num_start, self.pos).parse().ok() } else { None };

        match self.peek() {
            Some(c @ (b'<' | b'>')) => {
                let direction = c as char;
                self.pos += 1;
                let marker_start = self.pos;
                match self.bytes[self.pos..].iter().position(|&b| b == c) {
                    Some(rel) => {
                        let marker = self.slice_str(marker_start, marker_start + rel);
                        self.pos = marker_start + rel + 1;
                        // Expect terminating "%esc" where esc == direction; tolerate its absence.
                        if self.peek() == Some(b'%') && self.byte_at(self.pos + 1) == Some(c) {
                            self.pos += 2;
                        }
                        Ok(Some(Token::Percent { meaning: PercentMeaning::Truncated { number, direction, marker } }))
                    }
                    None if self.strict => {
                        Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedColor })
                    }
                    None => Ok(None),
                }
            }
            Some(c) => {
                self.pos += 1;
                match percent_meaning(c as char) {
                    Some(meaning) => Ok(Some(Token::Percent { meaning })),
                    None if self.strict => {
                        Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnknownEscape })
                    }
                    None => Ok(Some(Token::Percent { meaning: PercentMeaning::Unknown { letter: c as char } })),
                }
            }
            None => Ok(Some(Token::Literal(self.slice_str(num_start - 1, self.pos)))),
        }
    }

    fn read_condition(&mut self, error_pos: usize) -> Result<Token, Ps1ParseError> {
        self.pos += 1; // consume '('
        let num_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let number = if self.pos > num_start { self.slice_str(num_start, self.pos).parse().ok() } else { None };

        let test = match self.peek() {
            Some(c) => {
                self.pos += 1;
                c as char
            }
            None => return Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedCondition }),
        };
        let sep = match self.peek() {
            Some(c) => {
                self.pos += 1;
                c as char
            }
            None => return Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedCondition }),
        };

        let body_start = self.pos;
        let mut depth = 1usize;
        loop {
            match self.peek() {
                Some(b'(') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
                None => return Err(Ps1ParseError { position: error_pos, kind: Ps1ParseErrorKind::UnclosedCondition }),
            }
        }
        let body = self.slice_str(body_start, self.pos);
        self.pos += 1; // consume ')'

        let sep_byte = sep as u8;
        let (true_text, false_text) = match body.as_bytes().iter().position(|&b| b == sep_byte) {
            Some(idx) => (&body[..idx], &body[idx + 1..]),
            None => (body.as_str(), ""),
        };

        let true_branch = tokenize(true_text, self.strict)?;
        let false_branch = tokenize(false_text, self.strict)?;

        Ok(Token::Condition { number, test, sep, true_branch, false_branch })
    }

    fn read_dollar(&mut self) -> Result<Token, Ps1ParseError> {
        let error_pos = self.pos;
        self.pos += 1; // consume '$'
        match self.peek() {
            Some(open @ (b'(' | b'{')) => {
                let close = if open == b'(' { b')' } else { b'}' };
                self.pos += 1;
                let body_start = self.pos;
                let mut depth = 1usize;
                loop {
                    match self.peek() {
                        Some(c) if c == open => {
                            depth += 1;
                            self.pos += 1;
                        }
                        Some(c) if c == close => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            self.pos += 1;
                        }
                        Some(_) => self.pos += 1,
                        None => {
                            return Err(Ps1ParseError {
                                position: error_pos,
                                kind: Ps1ParseErrorKind::UnclosedCommand,
                            })
                        }
                    }
                }
                let body = self.slice_str(body_start, self.pos);
                self.pos += 1; // consume close
                Ok(Token::Command { kind: CommandKind::Substitution, body })
            }
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
                    self.pos += 1;
                }
                let body = self.slice_str(start, self.pos);
                Ok(Token::Command { kind: CommandKind::Variable, body })
            }
        }
    }
}

fn percent_meaning(c: char) -> Option<PercentMeaning> {
    use PercentMeaning::*;
    Some(match c {
        'n' => Username,
        'm' => HostnameShort,
        'M' => HostnameFull,
        '~' => CurrentDirTilde,
        'd' | '/' => CurrentDir,
        'c' | '.' => CurrentDirTail,
        'h' | '!' => HistoryNumber,
        'T' => Time24h,
        't' | '@' => Time12h,
        '*' => Time24hSeconds,
        'w' => DateDayDd,
        'W' => DateMmDdYy,
        'D' => DateYyMmDd,
        '#' => PrivilegeIndicator,
        '?' => ExitStatus,
        'j' => JobCount,
        'l' => Tty,
        'L' => ShellLevel,
        '_' => ParserState,
        '^' => ParserStateReverse,
        'B' => StartBold,
        'b' => EndBold,
        'U' => StartUnderline,
        'u' => EndUnderline,
        'S' => StartStandout,
        's' => EndStandout,
        'F' => StartForegroundColor,
        'f' => EndForegroundColor,
        'K' => StartBackgroundColor,
        'k' => EndBackgroundColor,
        'E' => TerminalClearEol,
        _ => return None,
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'n' => {
                    out.push('\n');
                    i += 2;
                }
                b't' => {
                    out.push('\t');
                    i += 2;
                }
                b'r' => {
                    out.push('\r');
                    i += 2;
                }
                b'\\' => {
                    out.push('\\');
                    i += 2;
                }
                b'x' if i + 3 < bytes.len() => {
                    let hex = &raw[i + 2..i + 4];
                    match u8::from_str_radix(hex, 16) {
                        Ok(byte) => {
                            out.push(byte as char);
                            i += 4;
                        }
                        Err(_) => {
                            out.push('\\');
                            i += 1;
                        }
                    }
                }
                _ => {
                    out.push('\\');
                    i += 1;
                }
            }
        } else {
            let ch_len = raw[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            out.push_str(&raw[i..i + ch_len]);
            i += ch_len;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_plain_literal() {
        let tokens = tokenize("hello world", true).unwrap();
        assert_eq!(tokens, vec![Token::Literal("hello world".to_string())]);
    }

    #[test]
    fn tokenizes_known_percent_escapes() {
        let tokens = tokenize("%n@%m:%~", true).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Percent { meaning: PercentMeaning::Username },
                Token::Literal("@".to_string()),
                Token::Percent { meaning: PercentMeaning::HostnameShort },
                Token::Literal(":".to_string()),
                Token::Percent { meaning: PercentMeaning::CurrentDirTilde },
            ]
        );
    }

    #[test]
    fn unknown_escape_errors_in_strict_mode() {
        assert!(tokenize("%Q", true).is_err());
    }

    #[test]
    fn unknown_escape_is_lax_in_lax_mode() {
        let tokens = tokenize("%Q", false).unwrap();
        assert_eq!(tokens, vec![Token::Percent { meaning: PercentMeaning::Unknown { letter: 'Q' } }]);
    }

    #[test]
    fn tokenizes_named_color() {
        let tokens = tokenize("%F{red}hi%f", true).unwrap();
        assert_eq!(
            tokens[0],
            Token::ColorSeq(ColorBody::Named { ground: Ground::Foreground, color: "red".to_string() })
        );
    }

    #[test]
    fn tokenizes_raw_color_sequence_with_nesting() {
        let tokens = tokenize("%{%{x%}%}", true).unwrap();
        assert_eq!(tokens, vec![Token::ColorSeq(ColorBody::Raw("%{x%}".to_string()))]);
    }

    #[test]
    fn unclosed_color_errors_in_strict_mode() {
        assert!(tokenize("%{unterminated", true).is_err());
    }

    #[test]
    fn unclosed_color_degrades_to_literal_in_lax_mode() {
        let tokens = tokenize("%{unterminated", false).unwrap();
        assert_eq!(tokens, vec![Token::Literal("%{unterminated".to_string())]);
    }

    #[test]
    fn tokenizes_condition() {
        let tokens = tokenize("%(?.ok.fail)", true).unwrap();
        match &tokens[0] {
            Token::Condition { test, sep, true_branch, false_branch, .. } => {
                assert_eq!(*test, '?');
                assert_eq!(*sep, '.');
                assert_eq!(true_branch, &[Token::Literal("ok".to_string())]);
                assert_eq!(false_branch, &[Token::Literal("fail".to_string())]);
            }
            other => panic!("expected Condition, got {other:?}"),
        }
    }

    #[test]
    fn tokenizes_command_substitution_with_nesting() {
        let tokens = tokenize("$(echo $(whoami))", true).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Command { kind: CommandKind::Substitution, body: "echo $(whoami)".to_string() }]
        );
    }

    #[test]
    fn tokenizes_variable() {
        let tokens = tokenize("$HOME/bin", true).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Command { kind: CommandKind::Variable, body: "HOME".to_string() },
                Token::Literal("/bin".to_string()),
            ]
        );
    }

    #[test]
    fn unescapes_literal_text() {
        let tokens = tokenize(r"a\nb\x41c", true).unwrap();
        assert_eq!(tokens, vec![Token::Literal("a\nbAc".to_string())]);
    }
}

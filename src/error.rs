//! Error taxonomy (spec.md §7).
//!
//! Fatal errors (`ConfigError`, `PatternCompileError`, I/O failures) bubble
//! up through `color_eyre::eyre::Result` at the binary boundary, the same
//! way skim's `lib.rs`/`skim.rs` propagate setup failures. Non-fatal errors
//! (`Ps1ParseError`, `StyleParseError`) are caught at the call site and
//! degrade the corresponding feature for the current invocation, logging a
//! `warn!` rather than failing the pick.

use thiserror::Error;

/// Malformed configuration: bad TOML, an unknown color name, an unknown
/// alphabet name. Fatal to the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A color spec was neither a known named color nor `#RRGGBB`
    #[error("unknown color '{0}'")]
    UnknownColor(String),
    /// An alphabet name was not one of the built-in seed sets
    #[error("unknown alphabet '{0}'")]
    UnknownAlphabet(String),
    /// The TOML config file failed to parse
    #[error("invalid config file: {0}")]
    Toml(#[from] TomlErrorShim),
}

/// Thin wrapper so `ConfigError` doesn't need the `toml` crate as a direct
/// dependency of the non-cli build of this crate.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct TomlErrorShim(pub String);

/// A custom `--regexp` pattern failed to compile. Fatal.
#[derive(Error, Debug)]
#[error("invalid pattern '{pattern}': {source}")]
pub struct PatternCompileError {
    /// The pattern text that failed to compile
    pub pattern: String,
    /// The underlying regex compilation error
    #[source]
    pub source: regex::Error,
}

/// The kind of PS1 parse failure (spec.md §4.D.4).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ps1ParseErrorKind {
    /// An opened `%{` was never closed (strict mode)
    #[error("unclosed color sequence")]
    UnclosedColor,
    /// An opened `%(` condition was never closed (strict mode)
    #[error("unclosed condition")]
    UnclosedCondition,
    /// An opened `$(` or `${` command substitution was never closed
    #[error("unclosed command substitution")]
    UnclosedCommand,
    /// A `%X` escape letter was not recognized (strict mode)
    #[error("unknown escape")]
    UnknownEscape,
}

/// A PS1 template failed to parse. Non-fatal: disables PS1 filtering for the
/// current invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("PS1 parse error at byte {position}: {kind}")]
pub struct Ps1ParseError {
    /// Byte offset into the PS1 template where the error was detected
    pub position: usize,
    /// What went wrong
    pub kind: Ps1ParseErrorKind,
}

/// A compiled PS1 regex failed to build from otherwise-valid tokens.
#[derive(Error, Debug)]
#[error("failed to compile PS1 pattern: {0}")]
pub struct MatchCompileError(#[from] pub regex::Error);

/// The ANSI style extractor could not parse a line. Non-fatal: the line
/// degrades to a single unstyled fragment.
#[derive(Error, Debug)]
#[error("failed to parse styled line: {0}")]
pub struct StyleParseError(pub String);

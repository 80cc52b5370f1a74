//! PS1 parser + matcher (spec.md §4.D).
//!
//! A `PS1` template is tokenized ([`token`]), compiled to a regex
//! ([`compile`]), then matched against a preprocessed copy of the captured
//! text to locate shell-prompt regions, which the [`engine`](crate::engine)
//! excludes from its output (spec.md §4.F.2 step 5).

pub mod compile;
pub mod token;

use regex::Regex;
use thiserror::Error;

use crate::error::{MatchCompileError, Ps1ParseError};
use crate::Region;
pub use compile::CompileOptions;
pub use token::Token;

/// Either stage of parse-and-compile can fail; the convenience API in this
/// module composes both of the per-stage error types from [`crate::error`].
#[derive(Error, Debug)]
pub enum Ps1Error {
    /// Tokenization failed (spec.md §4.D.4)
    #[error(transparent)]
    Parse(#[from] Ps1ParseError),
    /// The tokens compiled to an invalid regex
    #[error(transparent)]
    Compile(#[from] MatchCompileError),
}

/// Options controlling both tokenization strictness and regex compilation.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Unclosed groups / unknown escapes are fatal to tokenization
    pub strict: bool,
    /// Strip ANSI escapes from the input before matching, and compile
    /// `ColorSeq`/color-marker tokens to empty
    pub ignore_colors: bool,
    /// Collapse whitespace runs in the input before matching, and compile
    /// literal whitespace as `\s*` instead of `\s+`
    pub ignore_spacing: bool,
    /// Case-insensitive match
    pub case_insensitive: bool,
    /// If `>0`, anchor the compiled pattern as `^…$`
    pub max_line_span: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { strict: true, ignore_colors: false, ignore_spacing: false, case_insensitive: false, max_line_span: 1 }
    }
}

impl MatchOptions {
    fn to_compile_options(self) -> CompileOptions {
        CompileOptions {
            ignore_colors: self.ignore_colors,
            ignore_spacing: self.ignore_spacing,
            case_insensitive: self.case_insensitive,
            max_line_span: self.max_line_span,
        }
    }
}

/// A single match of a compiled PS1 pattern against the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMatch {
    /// The region of the (preprocessed) input this prompt occupies
    pub region: Region,
    /// Named capture groups, in declaration order
    pub groups: Vec<(String, String)>,
}

/// A tokenized and compiled PS1 template, ready to match repeatedly.
pub struct ParsedPs1 {
    tokens: Vec<Token>,
    regex: Regex,
    options: MatchOptions,
}

impl ParsedPs1 {
    /// Tokenizes and compiles `ps1`.
    pub fn new(ps1: &str, options: MatchOptions) -> Result<Self, Ps1Error> {
        let tokens = token::tokenize(ps1, options.strict)?;
        let regex = compile::compile(&tokens, &options.to_compile_options())?;
        Ok(Self { tokens, regex, options })
    }

    /// The tokens this template parsed into.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Finds all non-overlapping matches of this template in `text`.
    ///
    /// `text` is preprocessed first (ANSI-stripped under `ignore_colors`,
    /// whitespace-collapsed under `ignore_spacing`); positions in the
    /// returned [`PromptMatch`]es are against that preprocessed copy, per
    /// spec.md §4.D.3.
    pub fn find_matches(&self, text: &str) -> Vec<PromptMatch> {
        let preprocessed = preprocess(text, &self.options);
        let line_starts = line_start_offsets(&preprocessed);

        self.regex
            .captures_iter(&preprocessed)
            .map(|caps| {
                let m = caps.get(0).expect("capture 0 always present");
                let (start_line, start_col) = offset_to_line_col(&line_starts, m.start());
                let (end_line, end_col) = offset_to_line_col(&line_starts, m.end());
                let groups = self
                    .regex
                    .capture_names()
                    .flatten()
                    .filter_map(|name| caps.name(name).map(|v| (name.to_string(), v.as_str().to_string())))
                    .collect();
                PromptMatch { region: Region { start_line, start_col, end_line, end_col }, groups }
            })
            .collect()
    }
}

/// Tokenizes, compiles, and matches `ps1` against `text` in one call
/// (spec.md §6.1 `parse_and_match`).
pub fn parse_and_match(ps1: &str, text: &str, options: MatchOptions) -> Result<Vec<PromptMatch>, Ps1Error> {
    Ok(ParsedPs1::new(ps1, options)?.find_matches(text))
}

/// Convenience wrapper returning just the matched regions, the shape the
/// engine's PS1 filter consumes (spec.md §4.F.2 step 5).
pub fn find_prompt_regions(ps1: &str, text: &str, options: MatchOptions) -> Result<Vec<Region>, Ps1Error> {
    Ok(parse_and_match(ps1, text, options)?.into_iter().map(|m| m.region).collect())
}

fn preprocess(text: &str, options: &MatchOptions) -> String {
    let stripped = if options.ignore_colors { crate::ansi::strip_ansi_bytes(text) } else { text.to_string() };
    if options.ignore_spacing {
        collapse_spacing(&stripped)
    } else {
        stripped
    }
}

/// Collapses runs of horizontal whitespace to a single space, preserving
/// newlines so line/column accounting stays valid.
fn collapse_spacing(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            out.push(c);
        } else if c == ' ' || c == '\t' {
            out.push(' ');
            while chars.peek().is_some_and(|&c| c == ' ' || c == '\t') {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn line_start_offsets(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

fn offset_to_line_col(line_starts: &[usize], offset: usize) -> (usize, usize) {
    let line = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    (line, offset - line_starts[line])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_simple_prompt() {
        let ps1 = "%n@%m:%~ $ ";
        let text = "kumiko@host:~/proj $ cat file.txt\nfoo";
        let opts = MatchOptions { max_line_span: 0, ..Default::default() };
        let regions = find_prompt_regions(ps1, text, opts).unwrap();
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_eq!(r.start_line, 0);
        assert_eq!(r.start_col, 0);
        // The prompt region should end right before "cat file.txt"
        let prompt_text = &text[r.start_col..r.end_col];
        assert!(prompt_text.starts_with("kumiko@host:~/proj $"));
        assert!(!prompt_text.contains("file.txt"));
    }

    #[test]
    fn groups_are_captured() {
        let ps1 = "%n@%m ";
        let opts = MatchOptions { max_line_span: 0, ..Default::default() };
        let matches = parse_and_match(ps1, "alice@box ", opts).unwrap();
        assert_eq!(matches.len(), 1);
        let groups: std::collections::HashMap<_, _> = matches[0].groups.iter().cloned().collect();
        assert_eq!(groups.get("username"), Some(&"alice".to_string()));
        assert_eq!(groups.get("hostname"), Some(&"box".to_string()));
    }

    #[test]
    fn strict_tokenize_error_propagates_as_ps1_error() {
        let err = ParsedPs1::new("%Q", MatchOptions::default());
        assert!(matches!(err, Err(Ps1Error::Parse(_))));
    }

    #[test]
    fn idempotent_on_its_own_output() {
        // Invariant 8 (spec.md §8): re-matching a matched substring yields
        // the same groups.
        let ps1 = "%n@%m ";
        let opts = MatchOptions { max_line_span: 0, ..Default::default() };
        let parsed = ParsedPs1::new(ps1, opts).unwrap();
        let first = parsed.find_matches("alice@box ");
        let matched_text = "alice@box ";
        let second = parsed.find_matches(matched_text);
        assert_eq!(first[0].groups, second[0].groups);
    }

    #[test]
    fn ignore_spacing_collapses_whitespace_preserving_lines() {
        assert_eq!(collapse_spacing("a   b\nc\t\td"), "a b\nc d");
    }
}

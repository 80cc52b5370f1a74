//! Token → regex compilation (spec.md §4.D.2).
//!
//! Named capture groups double as the "group index -> name" side table the
//! design notes ask for (§9): the `regex` crate already exposes named
//! groups, so unlike a library without that feature we don't need a
//! separate table, just unique names, which [`NameAllocator`] guarantees.

use std::collections::HashMap;

use regex::Regex;

use super::token::{ColorBody, CommandKind, PercentMeaning, Token};
use crate::error::MatchCompileError;

/// Options controlling regex compilation (mirrors the TOML/CLI knobs that
/// reach this layer, spec.md §4.D.2).
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Compile `ColorSeq` tokens to empty instead of an ANSI-eating fragment
    pub ignore_colors: bool,
    /// Collapse whitespace runs (`\s*`) instead of requiring them (`\s+`)
    pub ignore_spacing: bool,
    /// Wrap the compiled pattern in `(?i)`
    pub case_insensitive: bool,
    /// If `>0`, anchor the pattern as `^…$` under `(?ms)`
    pub max_line_span: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { ignore_colors: false, ignore_spacing: false, case_insensitive: false, max_line_span: 0 }
    }
}

const ANSI_EATER: &str = r"(?:\x1b\[[0-9;]*m)*";

struct NameAllocator {
    used: HashMap<String, u32>,
}

impl NameAllocator {
    fn new() -> Self {
        Self { used: HashMap::new() }
    }

    /// Returns a regex-safe group name based on `base`, unique within this
    /// compilation (the `regex` crate rejects duplicate capture names).
    fn alloc(&mut self, base: &str) -> String {
        let sanitized: String =
            base.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }).collect();
        let sanitized = if sanitized.is_empty() || sanitized.chars().next().unwrap().is_ascii_digit() {
            format!("g_{sanitized}")
        } else {
            sanitized
        };
        let count = self.used.entry(sanitized.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            sanitized
        } else {
            format!("{sanitized}{count}")
        }
    }
}

/// Compiles `tokens` to a pattern string (spec.md §4.D.2).
pub fn compile_pattern(tokens: &[Token], opts: &CompileOptions) -> String {
    let mut names = NameAllocator::new();
    let body = compile_sequence(tokens, opts, &mut names);
    let body = if opts.max_line_span > 0 { format!("^{body}$") } else { body };
    let flags = if opts.case_insensitive { "(?ims)" } else { "(?ms)" };
    format!("{flags}{body}")
}

/// Compiles `tokens` and builds the `Regex`.
///
/// # Errors
///
/// Returns [`MatchCompileError`] if the compiled pattern fails to build,
/// which can only happen from a name-allocation bug (groups are always
/// uniquified) or the underlying `regex` crate rejecting a byte-escaped
/// literal.
pub fn compile(tokens: &[Token], opts: &CompileOptions) -> Result<Regex, MatchCompileError> {
    let pattern = compile_pattern(tokens, opts);
    Regex::new(&pattern).map_err(MatchCompileError)
}

fn compile_sequence(tokens: &[Token], opts: &CompileOptions, names: &mut NameAllocator) -> String {
    let fragments: Vec<String> = tokens.iter().map(|t| compile_token(t, opts, names)).collect();
    join_fragments(&fragments, opts)
}

fn join_fragments(fragments: &[String], opts: &CompileOptions) -> String {
    let sep = if opts.ignore_colors { "" } else { ANSI_EATER };
    fragments.join(sep)
}

fn compile_token(token: &Token, opts: &CompileOptions, names: &mut NameAllocator) -> String {
    match token {
        Token::Literal(text) => compile_literal(text, opts),
        Token::ColorSeq(_) => {
            if opts.ignore_colors {
                String::new()
            } else {
                ANSI_EATER.to_string()
            }
        }
        Token::Condition { true_branch, false_branch, .. } => {
            let a = compile_sequence(true_branch, opts, names);
            let b = compile_sequence(false_branch, opts, names);
            if a.is_empty() || b.is_empty() {
                format!("(?:{a}|{b})?")
            } else {
                format!("(?:{a}|{b})")
            }
        }
        Token::Percent { meaning } => compile_percent(meaning, opts, names),
        Token::Command { kind, body } => compile_command(*kind, body, names),
    }
}

fn compile_literal(text: &str, opts: &CompileOptions) -> String {
    let mut out = String::new();
    let mut chars = text.chars().peekable();
    let mut run = String::new();
    let ws_pattern = if opts.ignore_spacing { r"\s*" } else { r"\s+" };

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            if !run.is_empty() {
                out.push_str(&regex::escape(&run));
                run.clear();
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            out.push_str(ws_pattern);
        } else {
            run.push(c);
            chars.next();
        }
    }
    if !run.is_empty() {
        out.push_str(&regex::escape(&run));
    }
    out
}

fn compile_percent(meaning: &PercentMeaning, opts: &CompileOptions, names: &mut NameAllocator) -> String {
    use PercentMeaning::*;
    match meaning {
        Username => format!("(?P<{}>[\\w.\\-]+)", names.alloc("username")),
        HostnameShort | HostnameFull => format!("(?P<{}>[\\w.\\-]+)", names.alloc("hostname")),
        CurrentDirTilde | CurrentDir | CurrentDirTail => format!("(?P<{}>.*?)", names.alloc("current_dir")),
        HistoryNumber => format!("(?P<{}>\\d+)", names.alloc("history")),
        Time24h | Time12h | Time24hSeconds => format!("(?P<{}>[0-9:apmAPM ]+)", names.alloc("time")),
        DateDayDd | DateMmDdYy | DateYyMmDd => format!("(?P<{}>\\S+)", names.alloc("date")),
        DateFormat { .. } => format!("(?P<{}>\\S+)", names.alloc("date")),
        PrivilegeIndicator => format!("(?P<{}>[#%])", names.alloc("privilege")),
        ExitStatus => format!("(?P<{}>-?\\d+)", names.alloc("exit_status")),
        JobCount => r"\d+".to_string(),
        Tty => r"\S+".to_string(),
        ShellLevel => r"\d+".to_string(),
        ParserState | ParserStateReverse => String::new(),
        StartBold | EndBold | StartUnderline | EndUnderline | StartStandout | EndStandout
        | StartForegroundColor | EndForegroundColor | StartBackgroundColor | EndBackgroundColor => {
            if opts.ignore_colors {
                String::new()
            } else {
                ANSI_EATER.to_string()
            }
        }
        TerminalClearEol => {
            if opts.ignore_colors {
                String::new()
            } else {
                r"(?:\x1b\[K)?".to_string()
            }
        }
        LiteralSpace => {
            if opts.ignore_spacing {
                r"\s*".to_string()
            } else {
                r"\s+".to_string()
            }
        }
        VariableReference { name, .. } => format!("(?P<{}>\\S*)", names.alloc(&format!("var_{name}"))),
        // Path truncation has no closed-form regex equivalent; approximate
        // as a non-greedy wildcard (see DESIGN.md).
        Truncated { .. } => ".*?".to_string(),
        Unknown { .. } => String::new(),
    }
}

fn compile_command(kind: CommandKind, body: &str, names: &mut NameAllocator) -> String {
    match kind {
        CommandKind::Substitution => format!("(?P<{}>.*?)", names.alloc("command_time")),
        CommandKind::Variable => format!("(?P<{}>\\S*)", names.alloc(&format!("var_{body}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::token::tokenize;
    use super::*;

    #[test]
    fn compiles_username_hostname_cwd() {
        let tokens = tokenize("%n@%m:%~ $ ", true).unwrap();
        let pattern = compile_pattern(&tokens, &CompileOptions::default());
        let re = Regex::new(&pattern).unwrap();
        let caps = re.captures("kumiko@host:~/proj $ ").unwrap();
        assert_eq!(&caps["username"], "kumiko");
        assert_eq!(&caps["hostname"], "host");
        assert_eq!(&caps["current_dir"], "~/proj");
    }

    #[test]
    fn duplicate_group_bases_are_uniquified() {
        let tokens = tokenize("%m %M", true).unwrap();
        let pattern = compile_pattern(&tokens, &CompileOptions::default());
        assert!(Regex::new(&pattern).is_ok());
        assert!(pattern.contains("hostname") && pattern.contains("hostname2"));
    }

    #[test]
    fn ignore_colors_drops_ansi_eater() {
        let tokens = tokenize("%Babc%b", true).unwrap();
        let with_colors = compile_pattern(&tokens, &CompileOptions::default());
        let without = compile_pattern(&tokens, &CompileOptions { ignore_colors: true, ..Default::default() });
        assert!(with_colors.contains("x1b"));
        assert!(!without.contains("x1b"));
    }

    #[test]
    fn condition_compiles_as_alternation() {
        let tokens = tokenize("%(?.yes.no)", true).unwrap();
        let pattern = compile_pattern(&tokens, &CompileOptions::default());
        let re = Regex::new(&pattern).unwrap();
        assert!(re.is_match("yes"));
        assert!(re.is_match("no"));
    }

    #[test]
    fn max_line_span_anchors_pattern() {
        let tokens = tokenize("abc", true).unwrap();
        let pattern = compile_pattern(&tokens, &CompileOptions { max_line_span: 1, ..Default::default() });
        assert!(pattern.starts_with("(?ms)^"));
        assert!(pattern.ends_with('$'));
    }

    #[test]
    fn case_insensitive_prefixes_flag() {
        let tokens = tokenize("abc", true).unwrap();
        let pattern = compile_pattern(&tokens, &CompileOptions { case_insensitive: true, ..Default::default() });
        assert!(pattern.starts_with("(?ims)"));
    }
}

//! Match Engine (spec.md §4.F): the pipeline that turns parsed lines into a
//! deterministically ordered, hinted, non-overlapping set of [`Match`]es.
//!
//! Grounded on skim's `matcher.rs`: that file also holds a `State`-shaped
//! struct driving a pure scoring pipeline over a fixed item set; here the
//! pipeline is the regex battery + style/table merge + filters + hints
//! instead of fuzzy scoring, but the "build once in `new`, run a pure
//! `matches()` over it" split mirrors skim's `Matcher`/`MatcherControl`
//! split (construction is where state is built; the call is where it runs).

pub mod patterns;

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::alphabet::Alphabet;
use crate::error::PatternCompileError;
use crate::ps1::MatchOptions as Ps1MatchOptions;
use crate::table::TableConfig;
use crate::{ExclusionKind, ExclusionRule, Match, Region};

/// Configuration for a [`MatchEngine`] (spec.md §6.3's `[core]`/`[regexp]`/
/// `[plugins.*]` sections, minus anything that's purely a view concern).
#[derive(Clone)]
pub struct EngineConfig {
    /// The hint alphabet
    pub alphabet: Alphabet,
    /// Validated custom `--regexp` patterns, tag plus compiled regex
    custom_patterns: Vec<(String, Arc<Regex>)>,
    /// Whether style-derived matches (§4.F.2 step 2) are produced
    pub enable_color_detection: bool,
    /// Whether grid/table matches (§4.F.2 step 3) are produced
    pub enable_table_detection: bool,
    /// Table detector thresholds, used only when `enable_table_detection`
    pub table_config: TableConfig,
    /// An optional PS1 template plus match options, used to exclude prompt
    /// regions (§4.F.2 step 5)
    pub ps1: Option<(String, Ps1MatchOptions)>,
    /// User-defined exclusion regions (§4.F.2 step 6)
    pub exclusions: Vec<ExclusionRule>,
    /// Minimum line spacing between super-unique representatives (§4.F.4)
    pub min_spacing: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::by_name("qwerty").expect("qwerty is a built-in alphabet"),
            custom_patterns: Vec::new(),
            enable_color_detection: false,
            enable_table_detection: false,
            table_config: TableConfig::default(),
            ps1: None,
            exclusions: Vec::new(),
            min_spacing: 2,
        }
    }
}

impl EngineConfig {
    /// Validates and adds a custom `--regexp` pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternCompileError`] if `pattern` fails to compile; per
    /// spec.md §4.F.6 this is fatal and must surface to the caller before
    /// the engine runs.
    pub fn add_custom_pattern(&mut self, pattern: &str) -> Result<(), PatternCompileError> {
        let name = format!("custom{}", self.custom_patterns.len());
        let regex = crate::cache::cached_regex(&name, pattern)
            .map_err(|source| PatternCompileError { pattern: pattern.to_string(), source })?;
        self.custom_patterns.push((name, regex));
        Ok(())
    }
}

struct BatteryEntry {
    tag: String,
    is_sink: bool,
    regex: Arc<Regex>,
}

/// The match-finding pipeline over one captured block of text.
pub struct MatchEngine {
    lines: Vec<String>,
    spans: Vec<crate::StyleSpan>,
    config: EngineConfig,
    battery: Vec<BatteryEntry>,
}

impl MatchEngine {
    /// Builds an engine over `text`, splitting ANSI styling out via
    /// [`crate::ansi::parse`].
    pub fn new(text: &str, config: EngineConfig) -> Self {
        let parsed = crate::ansi::parse(text);
        let mut battery: Vec<BatteryEntry> = patterns::compiled_battery()
            .into_iter()
            .map(|(name, is_sink, regex)| BatteryEntry { tag: name.to_string(), is_sink, regex })
            .collect();
        battery.extend(
            config
                .custom_patterns
                .iter()
                .map(|(name, regex)| BatteryEntry { tag: name.clone(), is_sink: false, regex: regex.clone() }),
        );
        Self { lines: parsed.lines, spans: parsed.spans, config, battery }
    }

    /// The engine entry point (spec.md §6.1, §4.F.2): a pure function of
    /// (lines, alphabet, custom patterns, feature flags) plus `reverse` and
    /// `unique_level`.
    pub fn matches(&self, reverse: bool, unique_level: u8) -> Vec<Match> {
        let mut found = self.regex_matches();

        if self.config.enable_color_detection {
            let styled = self.style_matches();
            let styled = drop_overlapping(styled, &found);
            found.extend(styled);
            found.sort_by(|a, b| (a.y, a.x).cmp(&(b.y, b.x)));
        }

        if self.config.enable_table_detection {
            let grid = self.table_matches();
            let grid = drop_overlapping(grid, &found);
            found.extend(grid);
            found.sort_by(|a, b| (a.y, a.x).cmp(&(b.y, b.x)));
        }

        if unique_level >= 2 {
            found = super_unique(found, self.lines.len(), self.config.min_spacing);
        }

        if let Some((ps1, options)) = &self.config.ps1 {
            match crate::ps1::find_prompt_regions(ps1, &self.lines.join("\n"), *options) {
                Ok(regions) => found.retain(|m| !regions.iter().any(|r| r.overlaps_match(m))),
                Err(e) => warn!("ps1: disabling prompt filter for this invocation: {e}"),
            }
        }

        if !self.config.exclusions.is_empty() {
            let regions = self.exclusion_regions();
            found.retain(|m| !regions.iter().any(|r| r.overlaps_match(m)));
        }

        assign_hints(found, &self.config.alphabet, reverse, unique_level)
    }

    fn regex_matches(&self) -> Vec<Match> {
        let mut out = Vec::new();
        for (y, line) in self.lines.iter().enumerate() {
            out.extend(self.line_matches(y, line));
        }
        out
    }

    fn line_matches(&self, y: usize, line: &str) -> Vec<Match> {
        let mut out = Vec::new();
        let mut cursor = 0usize;

        while cursor <= line.len() {
            let winner = self
                .battery
                .iter()
                .enumerate()
                .filter_map(|(idx, entry)| entry.regex.captures_at(line, cursor).map(|c| (idx, entry, c)))
                .min_by_key(|(idx, _, caps)| (caps.get(0).expect("group 0 always matches").start(), *idx));

            let Some((_, entry, caps)) = winner else { break };
            let whole = caps.get(0).expect("group 0 always matches");

            if entry.is_sink {
                cursor = whole.end().max(cursor + 1);
                continue;
            }

            if let Some((x, mut text)) = extract_capture(&caps) {
                if entry.tag == "url" {
                    trim_trailing_quote(&mut text, line, x);
                }
                out.push(Match { x, y, pattern: entry.tag.clone(), text, hint: None });
            }
            cursor = whole.end().max(cursor + 1);
        }
        out
    }

    fn style_matches(&self) -> Vec<Match> {
        self.spans
            .iter()
            .filter(|s| !crate::table::is_noise(&s.text))
            .map(|s| Match { x: s.start_col, y: s.start_line, pattern: "styled".to_string(), text: s.text.clone(), hint: None })
            .collect()
    }

    fn table_matches(&self) -> Vec<Match> {
        let lines: Vec<&str> = self.lines.iter().map(String::as_str).collect();
        crate::table::detect_tables(&lines, &self.config.table_config)
            .into_iter()
            .flat_map(|t| t.cells)
            .map(|c| Match { x: c.start_col, y: c.line_index, pattern: "grid".to_string(), text: c.text, hint: None })
            .collect()
    }

    fn exclusion_regions(&self) -> Vec<Region> {
        let mut regions = Vec::new();
        for rule in &self.config.exclusions {
            if rule.pattern.is_empty() {
                continue;
            }
            match rule.kind {
                ExclusionKind::Regex => match crate::cache::cached_regex("exclusion", &rule.pattern) {
                    Ok(re) => {
                        for (y, line) in self.lines.iter().enumerate() {
                            for m in re.find_iter(line) {
                                regions.push(Region { start_line: y, start_col: m.start(), end_line: y, end_col: m.end() });
                            }
                        }
                    }
                    Err(e) => warn!("exclusion regex '{}' failed to compile: {e}", rule.pattern),
                },
                ExclusionKind::Text => {
                    for (y, line) in self.lines.iter().enumerate() {
                        let mut start = 0;
                        while let Some(rel) = line[start..].find(&rule.pattern) {
                            let abs = start + rel;
                            regions.push(Region {
                                start_line: y,
                                start_col: abs,
                                end_line: y,
                                end_col: abs + rule.pattern.len(),
                            });
                            start = abs + rule.pattern.len().max(1);
                        }
                    }
                }
            }
        }
        regions
    }
}

/// Extracts the capture text per spec.md §4.F.1 step 3: the named group
/// `match` if present and non-empty, else the first non-empty numbered
/// group, else the whole match. Returns `(absolute_start, text)`.
fn extract_capture(caps: &regex::Captures) -> Option<(usize, String)> {
    if let Some(m) = caps.name("match") {
        if !m.as_str().is_empty() {
            return Some((m.start(), m.as_str().to_string()));
        }
    }
    for i in 1..caps.len() {
        if let Some(m) = caps.get(i) {
            if !m.as_str().is_empty() {
                return Some((m.start(), m.as_str().to_string()));
            }
        }
    }
    let whole = caps.get(0)?;
    Some((whole.start(), whole.as_str().to_string()))
}

fn trim_trailing_quote(text: &mut String, line: &str, start: usize) {
    let last = match text.chars().last() {
        Some(c @ ('\'' | '"')) => c,
        _ => return,
    };
    let prefix = &line[..start];
    if prefix.trim_end().chars().last() == Some(last) {
        text.pop();
    }
}

fn drop_overlapping(candidates: Vec<Match>, existing: &[Match]) -> Vec<Match> {
    candidates.into_iter().filter(|c| !existing.iter().any(|e| e.overlaps(c))).collect()
}

/// Super-unique selection (spec.md §4.F.4).
fn super_unique(matches: Vec<Match>, total_lines: usize, min_spacing: usize) -> Vec<Match> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Match>> = HashMap::new();
    for m in matches {
        groups.entry(m.text.clone()).or_insert_with(|| {
            order.push(m.text.clone());
            Vec::new()
        }).push(m);
    }

    let singles: Vec<&String> = order.iter().filter(|t| groups[*t].len() == 1).collect();
    let multis: Vec<&String> = order.iter().filter(|t| groups[*t].len() > 1).collect();

    let mut chosen: Vec<Match> = singles.into_iter().map(|t| groups[t][0].clone()).collect();
    let mid = total_lines as f64 / 2.0;

    for text in multis {
        let mut candidates = groups[text].clone();
        candidates.sort_by(|a, b| {
            let da = (a.y as f64 - mid).abs();
            let db = (b.y as f64 - mid).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal).then(a.y.cmp(&b.y))
        });
        let pick = candidates
            .iter()
            .find(|m| chosen.iter().all(|c| (c.y as i64 - m.y as i64).abs() >= min_spacing as i64))
            .or_else(|| candidates.first())
            .cloned();
        if let Some(m) = pick {
            chosen.push(m);
        }
    }

    chosen.sort_by(|a, b| (a.y, a.x).cmp(&(b.y, b.x)));
    chosen
}

/// Hint assignment (spec.md §4.F.5).
fn assign_hints(mut matches: Vec<Match>, alphabet: &Alphabet, reverse: bool, unique_level: u8) -> Vec<Match> {
    let mut hints = alphabet.hints(matches.len());
    hints.reverse();

    if reverse {
        matches.reverse();
    }

    if unique_level == 1 {
        let mut seen: HashMap<String, String> = HashMap::new();
        for m in matches.iter_mut() {
            let hint = seen.get(&m.text).cloned().unwrap_or_else(|| {
                let h = hints.pop().unwrap_or_default();
                seen.insert(m.text.clone(), h.clone());
                h
            });
            m.hint = Some(hint);
        }
    } else {
        for m in matches.iter_mut() {
            m.hint = hints.pop();
        }
    }

    if reverse {
        matches.reverse();
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_alphabet(text: &str, letters: &str) -> MatchEngine {
        let mut config = EngineConfig::default();
        config.alphabet = Alphabet::new(letters);
        MatchEngine::new(text, config)
    }

    #[test]
    fn scenario_reverse_hinting() {
        let text = "lorem 127.0.0.1 lorem 255.255.255.255 lorem 127.0.0.1 lorem";
        let engine = engine_with_alphabet(text, "abcd");
        let matches = engine.matches(false, 0);
        assert_eq!(matches.len(), 3);
        assert_eq!(matches.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), vec![
            "127.0.0.1",
            "255.255.255.255",
            "127.0.0.1"
        ]);
        assert_eq!(matches.iter().map(|m| m.hint.clone().unwrap()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn scenario_unique_level_1() {
        let text = "lorem 127.0.0.1 lorem 255.255.255.255 lorem 127.0.0.1 lorem";
        let engine = engine_with_alphabet(text, "abcd");
        let matches = engine.matches(false, 1);
        assert_eq!(matches.iter().map(|m| m.hint.clone().unwrap()).collect::<Vec<_>>(), vec!["a", "b", "a"]);
    }

    #[test]
    fn scenario_super_unique() {
        let text = "127.0.0.1\n127.0.0.1\n127.0.0.2\n127.0.0.1";
        let engine = engine_with_alphabet(text, "abcd");
        let matches = engine.matches(false, 2);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "127.0.0.1");
        assert_eq!(matches[0].y, 0);
        assert_eq!(matches[1].text, "127.0.0.2");
        assert_eq!(matches[1].y, 2);
    }

    #[test]
    fn scenario_url_in_single_quotes() {
        let text = "curl 'https://github.com/foo?x=1' \\";
        let engine = MatchEngine::new(text, EngineConfig::default());
        let matches = engine.matches(false, 0);
        let url_match = matches.iter().find(|m| m.pattern == "url").unwrap();
        assert_eq!(url_match.text, "https://github.com/foo?x=1");
        assert!(!url_match.text.ends_with('\''));
    }

    #[test]
    fn scenario_ps1_filter() {
        let text = "kumiko@host:~/proj $ cat file.txt\nfoo";
        let mut config = EngineConfig::default();
        config.ps1 = Some((
            "%n@%m:%~ $ ".to_string(),
            Ps1MatchOptions { max_line_span: 0, ..Default::default() },
        ));
        let engine = MatchEngine::new(text, config);
        let matches = engine.matches(false, 0);
        assert!(matches.iter().any(|m| m.text == "file.txt"));
        assert!(!matches.iter().any(|m| m.text.contains("kumiko") || m.text.contains("proj")));
    }

    #[test]
    fn no_two_matches_overlap() {
        let text = "visit https://example.com/path?x=1 now";
        let engine = MatchEngine::new(text, EngineConfig::default());
        let matches = engine.matches(false, 0);
        for i in 0..matches.len() {
            for j in (i + 1)..matches.len() {
                assert!(!matches[i].overlaps(&matches[j]));
            }
        }
    }

    #[test]
    fn hint_count_matches_match_count() {
        let text = "a.txt b.rs c.md d.json";
        let engine = MatchEngine::new(text, EngineConfig::default());
        let matches = engine.matches(false, 0);
        assert!(matches.iter().all(|m| m.hint.is_some()));
    }

    #[test]
    fn custom_pattern_is_validated_at_config_time() {
        let mut config = EngineConfig::default();
        assert!(config.add_custom_pattern("[").is_err());
        assert!(config.add_custom_pattern(r"TODO:\s*\w+").is_ok());
    }

    #[test]
    fn order_is_pure_function_of_inputs() {
        let text = "alpha 10.0.0.1 beta 10.0.0.2";
        let a = MatchEngine::new(text, EngineConfig::default()).matches(false, 0);
        let b = MatchEngine::new(text, EngineConfig::default()).matches(false, 0);
        assert_eq!(a, b);
    }
}

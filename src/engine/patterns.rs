//! The fixed regex battery (spec.md §4.F.1, §6.1).
//!
//! Grounded on skim's `matcher.rs::NUM_THREADS`/`OPT_MATCHER_THREAD_POOL`
//! `LazyLock` idiom: the battery compiles once per process and is shared
//! from then on. Every pattern that should only contribute part of its
//! match defines a named group called `match`; [`super::extract_capture`]
//! prefers it per spec.md §4.F.1 step 3.
//!
//! Declaration order is significant: it is the tie-break when two patterns
//! start at the same column (spec.md §4.F.1 step 1), and must match
//! spec.md:227's battery order bit-for-bit. `path`'s own spec-given index
//! already precedes `date_slash`'s, which settles the open question in
//! spec.md §9 (a dated fixture like `10/12/2024` reads as a path-shaped
//! token, not a date) without relocating `date_slash` out of its
//! spec-fixed last slot.

use std::sync::{Arc, LazyLock};

use regex::Regex;

/// A named pattern from the fixed battery.
pub struct Pattern {
    /// The pattern's tag, e.g. `"url"`, used as `Match::pattern`
    pub name: &'static str,
    /// Whether a match against this pattern is discarded rather than
    /// emitted (only `"bash"`, the ANSI noise eater)
    pub is_sink: bool,
    regex: &'static str,
}

/// The known file extensions [`PATTERN_SPECS`]'s `filename` pattern
/// recognizes. Closed and sorted, per spec.md §6.1.
pub const FILENAME_EXTENSIONS: &[&str] = &[
    "c", "cfg", "conf", "cpp", "csv", "css", "go", "h", "hpp", "html", "ini", "java", "js", "json", "jsx", "lock",
    "log", "md", "py", "rb", "rs", "sh", "toml", "ts", "tsx", "txt", "xml", "yaml", "yml",
];

fn filename_pattern() -> String {
    format!(r"(?P<match>[\w.\-]+\.(?:{}))\b", FILENAME_EXTENSIONS.join("|"))
}

const PATTERN_SPECS: &[(&str, &str)] = &[
    ("bash", r"\x1b\[[0-9;]*[a-zA-Z]"),
    ("markdown_url", r"\[[^\]\n]*\]\((?P<match>[^)\s]+)\)"),
    ("url", r"(?P<match>[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s<>]+)"),
    ("diff_summary", r"diff --git a/(?P<match>\S+) b/\S+"),
    ("diff_a", r"--- a/(?P<match>\S+)"),
    ("diff_b", r"\+\+\+ b/(?P<match>\S+)"),
    ("docker", r"(?P<match>sha256:[0-9a-f]{64})"),
    ("rust_test", r"test (?P<match>[\w:]+) \.\.\. (?:ok|FAILED|ignored)"),
    ("go_test", r"--- (?:PASS|FAIL): (?P<match>\S+)"),
    ("path", r"(?P<match>(?:~|\.{1,2})?(?:/[\w.\-]+){2,}/?)"),
    ("color", r"(?P<match>#[0-9a-fA-F]{6})\b"),
    ("uid", r"(?P<match>[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})"),
    ("ipfs", r"(?P<match>Qm[1-9A-HJ-NP-Za-km-z]{44})"),
    ("sha", r"\b(?P<match>[0-9a-fA-F]{7,40})\b"),
    ("ipv4_port", r"(?P<match>(?:[0-9]{1,3}\.){3}[0-9]{1,3}:[0-9]{1,5})"),
    ("ipv4", r"(?P<match>(?:[0-9]{1,3}\.){3}[0-9]{1,3})"),
    ("ipv6_port", r"(?P<match>\[[0-9a-fA-F:]+\]:[0-9]{1,5})"),
    ("ipv6", r"(?P<match>(?:[0-9a-fA-F]{1,4}:){2,7}[0-9a-fA-F]{1,4})"),
    ("address", r"(?P<match>0x[0-9a-fA-F]+)"),
    ("datetime_iso8601", r"(?P<match>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+\-]\d{2}:?\d{2})?)"),
    ("datetime_common", r"(?P<match>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})"),
    ("date_dash", r"(?P<match>\d{4}-\d{2}-\d{2})"),
    ("date_slash", r"(?P<match>\d{2}/\d{2}/\d{4})"),
];

/// The compiled battery, built once per process in declaration order. The
/// `filename` entry is spliced in right after `address` (its spec-fixed
/// slot) since its alternation is built from [`FILENAME_EXTENSIONS`] at
/// startup rather than being a `'static` literal, so it can't live directly
/// in [`PATTERN_SPECS`].
pub static BATTERY: LazyLock<Vec<Arc<Pattern>>> = LazyLock::new(|| {
    let mut patterns: Vec<Arc<Pattern>> = Vec::with_capacity(PATTERN_SPECS.len() + 1);
    for &(name, regex) in PATTERN_SPECS {
        patterns.push(Arc::new(Pattern { name, is_sink: name == "bash", regex }));
        if name == "address" {
            patterns.push(Arc::new(Pattern {
                name: "filename",
                is_sink: false,
                regex: Box::leak(filename_pattern().into_boxed_str()),
            }));
        }
    }
    patterns
});

/// Compiled regexes for [`BATTERY`], same order, via the process-wide
/// regex cache (spec.md §5) so repeated [`crate::engine::MatchEngine`]
/// construction within a process reuses one compiled set.
pub fn compiled_battery() -> Vec<(&'static str, bool, Arc<Regex>)> {
    BATTERY
        .iter()
        .map(|p| {
            let re = crate::cache::cached_regex(p.name, p.regex).expect("built-in pattern must compile");
            (p.name, p.is_sink, re)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtin_patterns_compile() {
        for (name, _, _) in compiled_battery() {
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn declaration_order_matches_spec_battery_order() {
        let expected = [
            "bash", "markdown_url", "url", "diff_summary", "diff_a", "diff_b", "docker", "rust_test", "go_test",
            "path", "color", "uid", "ipfs", "sha", "ipv4_port", "ipv4", "ipv6_port", "ipv6", "address", "filename",
            "datetime_iso8601", "datetime_common", "date_dash", "date_slash",
        ];
        let actual: Vec<&str> = BATTERY.iter().map(|p| p.name).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn filename_extensions_are_sorted() {
        let mut sorted = FILENAME_EXTENSIONS.to_vec();
        sorted.sort_unstable();
        assert_eq!(FILENAME_EXTENSIONS, sorted.as_slice());
    }
}

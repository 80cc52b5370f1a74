//! Fuzzy matching (spec.md §4.B), used by the [`view::list`](crate::view::list)
//! view to rank candidates against an incremental query.
//!
//! Grounded on skim's `fuzzy_matcher::FuzzyMatcher` trait shape
//! (`fuzzy_indices`/`fuzzy_match`): we keep the same two-method trait so
//! ranking call sites read the way skim's do, even though the scoring rule
//! here is this spec's own (consecutive-run + word-boundary bonus), not
//! skim's.

/// A single candidate's ranked result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch<'a> {
    /// The original candidate string
    pub text: &'a str,
    /// The index of `text` in the input slice, preserved for stable sort ties
    pub index: usize,
    /// The computed score (higher is better)
    pub score: i64,
    /// Byte... actually char indices into `text` that matched the query
    pub indices: Vec<usize>,
}

/// Trait for fuzzy matching text patterns against choices.
///
/// Mirrors skim's `fuzzy_matcher::FuzzyMatcher` trait shape.
pub trait FuzzyMatcher: Send + Sync {
    /// Matches `choice` against `pattern`, returning the score and the
    /// char indices of `choice` that matched, or `None` if `pattern` is not
    /// a subsequence of `choice`.
    fn fuzzy_indices(&self, choice: &str, pattern: &str) -> Option<(i64, Vec<usize>)>;

    /// Matches `choice` against `pattern`, returning only the score.
    fn fuzzy_match(&self, choice: &str, pattern: &str) -> Option<i64> {
        self.fuzzy_indices(choice, pattern).map(|(score, _)| score)
    }
}

/// The default (and only) fuzzy scoring algorithm specified in spec.md §4.B.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubsequenceMatcher;

fn is_word_boundary_before(chars: &[char], idx: usize) -> bool {
    if idx == 0 {
        return false;
    }
    matches!(chars[idx - 1], ' ' | '\t' | '/' | '\\' | '.')
}

fn is_case_boundary(chars: &[char], idx: usize) -> bool {
    idx > 0 && chars[idx - 1].is_lowercase() && chars[idx].is_uppercase()
}

impl FuzzyMatcher for SubsequenceMatcher {
    fn fuzzy_indices(&self, choice: &str, pattern: &str) -> Option<(i64, Vec<usize>)> {
        if pattern.is_empty() {
            return Some((0, Vec::new()));
        }

        let choice_chars: Vec<char> = choice.chars().collect();
        let pattern_chars: Vec<char> = pattern.chars().collect();

        let mut indices = Vec::with_capacity(pattern_chars.len());
        let mut pattern_idx = 0;
        for (i, &c) in choice_chars.iter().enumerate() {
            if pattern_idx < pattern_chars.len() && c == pattern_chars[pattern_idx] {
                indices.push(i);
                pattern_idx += 1;
            }
        }
        if pattern_idx < pattern_chars.len() {
            return None;
        }

        let mut score: i64 = if indices[0] == 0 { 100 } else { 50 };
        for w in indices.windows(2) {
            if w[1] == w[0] + 1 {
                score += 50;
            } else {
                score += 20;
            }
        }
        score += (1000 - choice_chars.len() as i64) / 10;

        for &idx in &indices {
            if idx == 0 {
                score += 10;
            } else if is_word_boundary_before(&choice_chars, idx) {
                score += 15;
            } else if is_case_boundary(&choice_chars, idx) {
                score += 10;
            }
        }

        Some((score, indices))
    }
}

/// Scores and ranks `candidates` against `query` using [`SubsequenceMatcher`].
///
/// Result order is descending score; ties preserve input order. An empty
/// query returns all candidates with score 0, in input order.
pub fn rank<'a>(query: &str, candidates: &[&'a str]) -> Vec<FuzzyMatch<'a>> {
    let matcher = SubsequenceMatcher;
    let mut results: Vec<FuzzyMatch<'a>> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, &text)| {
            matcher
                .fuzzy_indices(text, query)
                .map(|(score, indices)| FuzzyMatch { text, index, score, indices })
        })
        .collect();
    // Stable sort: ties preserve input order, which `index` encodes.
    results.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything_in_order() {
        let candidates = ["b", "a", "c"];
        let results = rank("", &candidates);
        assert_eq!(results.iter().map(|r| r.text).collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert!(results.iter().all(|r| r.score == 0));
    }

    #[test]
    fn non_subsequence_is_rejected() {
        let matcher = SubsequenceMatcher;
        assert!(matcher.fuzzy_indices("hello", "xyz").is_none());
    }

    #[test]
    fn prefix_match_scores_higher_than_mid_string() {
        let matcher = SubsequenceMatcher;
        let (prefix_score, _) = matcher.fuzzy_indices("abc", "a").unwrap();
        let (mid_score, _) = matcher.fuzzy_indices("xac", "a").unwrap();
        assert!(prefix_score > mid_score);
    }

    #[test]
    fn consecutive_matches_score_higher_than_scattered() {
        let matcher = SubsequenceMatcher;
        let (consecutive, _) = matcher.fuzzy_indices("abcdef", "ab").unwrap();
        let (scattered, _) = matcher.fuzzy_indices("axbxxx", "ab").unwrap();
        assert!(consecutive > scattered);
    }

    #[test]
    fn word_boundary_bonus_applies_after_separator() {
        let matcher = SubsequenceMatcher;
        let (boundary, _) = matcher.fuzzy_indices("foo/bar", "b").unwrap();
        let (no_boundary, _) = matcher.fuzzy_indices("foobar", "b").unwrap();
        assert!(boundary > no_boundary);
    }

    #[test]
    fn rank_orders_by_descending_score() {
        let candidates = ["xxbxx", "bxxxx", "xxxxb"];
        let results = rank("b", &candidates);
        assert_eq!(results[0].text, "bxxxx");
    }

    #[test]
    fn rank_ties_preserve_input_order() {
        let candidates = ["same", "same"];
        let results = rank("s", &candidates);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 1);
    }
}

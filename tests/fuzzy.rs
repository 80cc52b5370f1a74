//! Black-box tests for the fuzzy ranker used by the list view (spec.md §4.B).

use magonote::fuzzy::rank;

#[test]
fn subsequence_candidates_rank_above_non_matches() {
    let candidates = ["readme.md", "src/main.rs", "docker-compose.yml"];
    let results = rank("dcomp", &candidates);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "docker-compose.yml");
}

#[test]
fn empty_query_preserves_candidate_order() {
    let candidates = ["gamma", "alpha", "beta"];
    let results = rank("", &candidates);
    assert_eq!(results.iter().map(|r| r.text).collect::<Vec<_>>(), candidates.to_vec());
}

#[test]
fn matched_indices_point_at_the_matching_runes() {
    let candidates = ["abcdef"];
    let results = rank("bd", &candidates);
    assert_eq!(results.len(), 1);
    for &idx in &results[0].indices {
        assert!("abcdef".chars().nth(idx).is_some());
    }
}

//! Black-box tests against the public engine API, in skim's own
//! `tests/matcher.rs` style: build real input, call the public entry point,
//! assert on the returned `Vec` with no internal mocking.

use magonote::alphabet::Alphabet;
use magonote::engine::{EngineConfig, MatchEngine};

fn engine(text: &str, letters: &str) -> MatchEngine {
    let mut config = EngineConfig::default();
    config.alphabet = Alphabet::new(letters);
    MatchEngine::new(text, config)
}

#[test]
fn docker_ps_grid_is_detected_as_multi_space_table() {
    let header = "CONTAINER ID   IMAGE          COMMAND                  CREATED        STATUS       PORTS     NAMES";
    let row1 = "a1b2c3d4e5f6   nginx:latest   \"nginx -g 'daemon of…\"   2 hours ago    Up 2 hours             web";
    let row2 = "f6e5d4c3b2a1   redis:alpine   \"docker-entrypoint.s…\"   3 hours ago    Up 3 hours             cache";
    let lines = [header, row1, row2];

    let mut config = EngineConfig::default();
    config.enable_table_detection = true;
    let engine = MatchEngine::new(&lines.join("\n"), config);
    let matches = engine.matches(false, 0);

    let table_match = matches.iter().find(|m| m.pattern == "grid" && m.text == "CONTAINER ID");
    assert!(table_match.is_some(), "expected a grid match for the header's first cell, got: {matches:?}");
}

#[test]
fn empty_input_has_no_matches() {
    let engine = engine("", "abcd");
    assert!(engine.matches(false, 0).is_empty());
}

#[test]
fn whitespace_only_input_has_no_matches() {
    let engine = engine("   \n\t\n   ", "abcd");
    assert!(engine.matches(false, 0).is_empty());
}

#[test]
fn crlf_treats_carriage_return_as_content_and_splits_only_on_newline() {
    let text = "visit 10.0.0.1\r\nvisit 10.0.0.2\r\n";
    let engine = engine(text, "abcd");
    let matches = engine.matches(false, 0);
    assert_eq!(matches.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), vec!["10.0.0.1", "10.0.0.2"]);
    // the `\r` stays part of line 0's content rather than being treated as a separator
    assert_eq!(matches[0].y, 0);
    assert_eq!(matches[1].y, 1);
}

#[test]
fn duplicate_matches_on_the_same_line_each_get_their_own_hint() {
    let text = "10.0.0.1 and 10.0.0.1 again";
    let engine = engine(text, "abcd");
    let matches = engine.matches(false, 0);
    assert_eq!(matches.len(), 2);
    assert_ne!(matches[0].hint, matches[1].hint);
}

#[test]
fn match_text_is_substring_of_its_source_line_at_its_offset() {
    let text = "fetch https://example.com/a then /etc/hosts";
    let engine = engine(text, "abcd");
    for m in engine.matches(false, 0) {
        let line = text.lines().nth(m.y).unwrap();
        assert_eq!(&line[m.x..m.x + m.text.len()], m.text);
    }
}

#[test]
fn no_two_emitted_matches_overlap() {
    let text = "see https://example.com/path?x=1 and /var/log/syslog";
    let engine = engine(text, "abcd");
    let matches = engine.matches(false, 0);
    for i in 0..matches.len() {
        for j in (i + 1)..matches.len() {
            assert!(!matches[i].overlaps(&matches[j]), "{:?} overlaps {:?}", matches[i], matches[j]);
        }
    }
}

#[test]
fn order_is_a_pure_function_of_the_same_inputs() {
    let text = "10.0.0.1 10.0.0.2 /bin/ls https://example.com";
    let first = engine(text, "abcd").matches(false, 0);
    let second = engine(text, "abcd").matches(false, 0);
    assert_eq!(first, second);
}

#[test]
fn dated_filename_resolves_as_filename_not_a_truncated_date() {
    let text = "rotated log: 2024-01-02.log";
    let engine = engine(text, "abcd");
    let matches = engine.matches(false, 0);
    let hit = matches.iter().find(|m| m.text.contains("2024-01-02")).expect("expected a match on the dated filename");
    assert_eq!(hit.pattern, "filename");
    assert_eq!(hit.text, "2024-01-02.log");
}

#[test]
fn custom_regexp_pattern_participates_in_matching() {
    let mut config = EngineConfig::default();
    config.add_custom_pattern(r"TICKET-\d+").unwrap();
    let engine = MatchEngine::new("fixed in TICKET-42 today", config);
    let matches = engine.matches(false, 0);
    assert!(matches.iter().any(|m| m.text == "TICKET-42"));
}

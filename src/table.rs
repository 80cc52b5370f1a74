//! Tabular cell detector (spec.md §4.E).
//!
//! Finds aligned blocks of whitespace-delimited tokens ("grids") in
//! free-form text -- `docker ps`/`ls -alh`-style output -- without any
//! prior knowledge of column boundaries. Grounded on skim's own
//! `item_list.rs` layout math (it reasons about column widths the same
//! `unicode_width`-aware way) generalized here from fixed list columns to
//! detected, variable-width ones.

use unicode_width::UnicodeWidthStr;

/// Tunable thresholds for grid detection (spec.md §4.E.3, exposed via
/// `[plugins.tabledetection]`).
#[derive(Debug, Clone, Copy)]
pub struct TableConfig {
    /// Minimum number of lines to accept a block
    pub min_lines: usize,
    /// Minimum number of tokens on the starting line of a block
    pub min_columns: usize,
    /// Fraction of aligned positions required for two layouts to match
    pub alignment_threshold: f64,
    /// Max cell-count drift between two layouts still considered aligned
    pub max_column_variance: usize,
    /// Minimum confidence (round 2 / SingleSpace) to accept a block
    pub confidence_threshold: f64,
    /// Minimum token length to keep a cell
    pub min_word_length: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_lines: 2,
            min_columns: 2,
            alignment_threshold: 0.7,
            max_column_variance: 2,
            confidence_threshold: 0.6,
            min_word_length: 2,
        }
    }
}

/// Which tokenizer produced a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Split on runs of >= 1 whitespace
    SingleSpace,
    /// Split on runs of >= 2 whitespace; compound tokens like "File Name"
    /// stay joined
    MultiSpace,
}

/// One detected token inside a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    /// The cell's text
    pub text: String,
    /// Absolute line index in the input
    pub line_index: usize,
    /// Inclusive starting byte offset on `line_index`
    pub start_col: usize,
    /// Inclusive ending byte offset on `line_index`
    pub end_col: usize,
}

/// A detected aligned grid of cells (spec.md §4.E).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// First line of the block (inclusive)
    pub start_line: usize,
    /// Last line of the block (inclusive)
    pub end_line: usize,
    /// The modal column count of the block
    pub num_columns: usize,
    /// Confidence score in `[0, 1]`
    pub confidence: f64,
    /// Which tokenizer produced this table
    pub mode: TableMode,
    /// The extracted, noise-filtered cells
    pub cells: Vec<GridCell>,
}

type Token = (String, usize, usize);

#[derive(Clone)]
struct LineTokens {
    line_index: usize,
    tokens: Vec<Token>,
}

fn layout(tokens: &[Token]) -> Vec<usize> {
    tokens.iter().map(|(_, start, _)| *start).collect()
}

/// Tokenizes `line` by splitting on runs of whitespace at least `min_run`
/// long; shorter runs are swallowed into the surrounding token (spec.md
/// §4.E.1). `min_run == 1` is `SingleSpaceMode`, `min_run == 2` is
/// `MultiSpaceMode`.
fn tokenize(line: &str, min_run: usize) -> Vec<Token> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].1.is_whitespace() {
            i += 1;
            continue;
        }
        let start = chars[i].0;
        let mut last_end = start;
        let mut j = i;
        while j < chars.len() {
            if chars[j].1.is_whitespace() {
                let ws_start = j;
                while j < chars.len() && chars[j].1.is_whitespace() {
                    j += 1;
                }
                if j - ws_start >= min_run {
                    break;
                }
                // Short gap: swallow it into the current token.
            } else {
                last_end = chars[j].0 + chars[j].1.len_utf8();
                j += 1;
            }
        }
        tokens.push((line[start..last_end].to_string(), start, last_end - 1));
        i = j;
    }
    tokens
}

fn alignment_fraction(a: &[usize], b: &[usize], variance: usize) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let n = a.len().min(b.len());
    let aligned = (0..n).filter(|&i| (a[i] as i64 - b[i] as i64).unsigned_abs() as usize <= variance).count();
    aligned as f64 / a.len().max(b.len()) as f64
}

fn layouts_similar(prev: &[usize], next: &[usize], variance: usize, alignment_threshold: f64) -> bool {
    let count_close = (prev.len() as i64 - next.len() as i64).abs() <= 1;
    count_close || alignment_fraction(prev, next, variance) >= alignment_threshold
}

fn modal_count(rows: &[LineTokens]) -> usize {
    let mut counts = std::collections::HashMap::new();
    for row in rows {
        *counts.entry(row.tokens.len()).or_insert(0usize) += 1;
    }
    counts.into_iter().max_by_key(|&(_, n)| n).map(|(count, _)| count).unwrap_or(0)
}

fn compactness_score(reference: &[usize]) -> f64 {
    if reference.len() < 2 {
        return 1.0;
    }
    let scores: Vec<f64> = reference
        .windows(2)
        .map(|w| {
            let gap = (w[1] as i64 - w[0] as i64).unsigned_abs() as f64;
            if (3.0..=8.0).contains(&gap) {
                1.0
            } else {
                let dev = (gap - 3.0).abs().min((gap - 8.0).abs());
                (1.0 - dev / 8.0).max(0.0)
            }
        })
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn confidence(rows: &[LineTokens]) -> f64 {
    let modal = modal_count(rows);
    let consistency = rows.iter().filter(|r| r.tokens.len() == modal).count() as f64 / rows.len() as f64;

    let reference = rows
        .iter()
        .find(|r| r.tokens.len() == modal)
        .map(|r| layout(&r.tokens))
        .unwrap_or_default();

    let alignment = if rows.len() < 2 {
        1.0
    } else {
        let pairs: Vec<f64> = rows.windows(2).map(|w| alignment_fraction(&layout(&w[0].tokens), &layout(&w[1].tokens), 2)).collect();
        pairs.iter().sum::<f64>() / pairs.len() as f64
    };

    let compactness = compactness_score(&reference);

    (alignment + consistency + compactness) / 3.0
}

struct RawBlock {
    rows: Vec<LineTokens>,
    mode: TableMode,
    confidence: f64,
}

fn detect_blocks(
    lines: &[&str],
    mode: TableMode,
    threshold: f64,
    variance: usize,
    cfg: &TableConfig,
) -> Vec<RawBlock> {
    let min_run = match mode {
        TableMode::SingleSpace => 1,
        TableMode::MultiSpace => 2,
    };

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let first_tokens = tokenize(lines[i], min_run);
        if first_tokens.len() < cfg.min_columns {
            i += 1;
            continue;
        }

        let mut rows = vec![LineTokens { line_index: i, tokens: first_tokens }];
        let mut j = i + 1;
        while j < lines.len() {
            if lines[j].trim().is_empty() {
                break;
            }
            let tokens = tokenize(lines[j], min_run);
            let prev_layout = layout(&rows.last().unwrap().tokens);
            if layouts_similar(&prev_layout, &layout(&tokens), variance, cfg.alignment_threshold) {
                rows.push(LineTokens { line_index: j, tokens });
                j += 1;
            } else {
                break;
            }
        }

        if rows.len() >= cfg.min_lines {
            let score = confidence(&rows);
            if score >= threshold {
                blocks.push(RawBlock { rows, mode, confidence: score });
            }
        }
        i = j.max(i + 1);
    }
    blocks
}

/// A cell text is "noise" iff empty, narrower than 3 display columns, or
/// made of one repeated character (spec.md §4.E.6). Also used by the
/// engine to noise-filter style-derived matches (spec.md §4.F.2 step 2).
pub(crate) fn is_noise(text: &str) -> bool {
    text.is_empty() || text.width() < 3 || text.chars().all(|c| c == text.chars().next().unwrap())
}

const SKIP_PATTERNS: [&str; 5] = ["$", "#", "//", "/*", "*/"];

fn is_valid_cell(text: &str, min_word_length: usize) -> bool {
    if text.len() < min_word_length {
        return false;
    }
    if SKIP_PATTERNS.contains(&text) {
        return false;
    }
    if is_noise(text) {
        return false;
    }
    let is_numeric = text.chars().all(|c| c.is_ascii_digit());
    if is_numeric && text.len() < 4 {
        return false;
    }
    text.chars().any(|c| c.is_alphanumeric())
}

fn extract_cells(block: &RawBlock, cfg: &TableConfig) -> Vec<GridCell> {
    block
        .rows
        .iter()
        .flat_map(|row| {
            row.tokens.iter().filter(|(text, _, _)| is_valid_cell(text, cfg.min_word_length)).map(
                move |(text, start, end)| GridCell {
                    text: text.clone(),
                    line_index: row.line_index,
                    start_col: *start,
                    end_col: *end,
                },
            )
        })
        .collect()
}

fn block_range(block: &RawBlock) -> (usize, usize) {
    (block.rows.first().unwrap().line_index, block.rows.last().unwrap().line_index)
}

fn ranges_overlap(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// Runs both detection rounds and merges overlapping blocks (spec.md
/// §4.E.4): round 1 is permissive MultiSpace (threshold 0.4, variance 3),
/// round 2 is stricter SingleSpace (`cfg.confidence_threshold`, default
/// 0.6, variance 2). On an overlapping row range the higher-confidence
/// candidate wins; ties prefer MultiSpace so compound headers like "File
/// Name" survive.
pub fn detect_tables(lines: &[&str], cfg: &TableConfig) -> Vec<Table> {
    let round1 = detect_blocks(lines, TableMode::MultiSpace, 0.4, 3, cfg);
    let round2 = detect_blocks(lines, TableMode::SingleSpace, cfg.confidence_threshold, 2, cfg);

    let mut chosen: Vec<RawBlock> = Vec::new();
    let mut consumed_round2 = vec![false; round2.len()];

    for multi in round1 {
        let multi_range = block_range(&multi);
        let overlap = round2
            .iter()
            .enumerate()
            .find(|(idx, single)| !consumed_round2[*idx] && ranges_overlap(multi_range, block_range(single)));

        match overlap {
            Some((idx, single)) => {
                consumed_round2[idx] = true;
                if single.confidence > multi.confidence {
                    chosen.push(RawBlock { rows: single.rows.clone(), mode: single.mode, confidence: single.confidence });
                } else {
                    chosen.push(multi);
                }
            }
            None => chosen.push(multi),
        }
    }
    for (idx, single) in round2.into_iter().enumerate() {
        if !consumed_round2[idx] {
            chosen.push(single);
        }
    }

    chosen.sort_by_key(|b| b.rows.first().unwrap().line_index);

    chosen
        .iter()
        .map(|block| {
            let (start_line, end_line) = block_range(block);
            Table {
                start_line,
                end_line,
                num_columns: modal_count(&block.rows),
                confidence: block.confidence,
                mode: block.mode,
                cells: extract_cells(block, cfg),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_space_tokenizer_splits_on_any_whitespace() {
        let tokens = tokenize("foo  bar baz", 1);
        assert_eq!(tokens.iter().map(|(t, _, _)| t.as_str()).collect::<Vec<_>>(), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn multi_space_tokenizer_keeps_single_space_compounds() {
        let tokens = tokenize("File Name    Size", 2);
        assert_eq!(tokens.iter().map(|(t, _, _)| t.as_str()).collect::<Vec<_>>(), vec!["File Name", "Size"]);
    }

    #[test]
    fn noise_filter_rejects_short_and_repeated() {
        assert!(is_noise(""));
        assert!(is_noise("--"));
        assert!(is_noise("aaaa"));
        assert!(!is_noise("abc"));
    }

    #[test]
    fn detects_simple_two_column_table() {
        let lines = ["NAME   SIZE", "alpha  120", "bravo  240", "charlie 9001"];
        let cfg = TableConfig::default();
        let tables = detect_tables(&lines, &cfg);
        assert!(!tables.is_empty());
        let t = &tables[0];
        assert_eq!(t.start_line, 0);
        assert_eq!(t.end_line, 3);
        assert!(t.confidence >= cfg.confidence_threshold.min(0.4));
    }

    #[test]
    fn compound_header_is_not_split_by_dual_round_merge() {
        let lines = [
            "Permissions  Size  User    Date Modified      Name",
            "drwxr-xr-x   -     kumiko  2024-01-01T10:00   src",
            "drwxr-xr-x   -     kumiko  2024-01-02T11:00   docs",
        ];
        let cfg = TableConfig::default();
        let tables = detect_tables(&lines, &cfg);
        assert!(!tables.is_empty());
        let header_texts: Vec<&str> =
            tables[0].cells.iter().filter(|c| c.line_index == 0).map(|c| c.text.as_str()).collect();
        assert!(header_texts.contains(&"Date Modified"));
    }

    #[test]
    fn blank_line_terminates_block() {
        let lines = ["a  1", "b  2", "", "c  3", "d  4"];
        let cfg = TableConfig::default();
        let tables = detect_tables(&lines, &cfg);
        assert!(tables.iter().all(|t| t.end_line < 2 || t.start_line > 2));
    }

    #[test]
    fn cell_text_matches_source_line_slice() {
        let lines = ["alpha  beta", "gamma  delta"];
        let cfg = TableConfig::default();
        let tables = detect_tables(&lines, &cfg);
        for table in &tables {
            for cell in &table.cells {
                assert_eq!(cell.text, lines[table_line(&lines, cell.line_index)][cell.start_col..=cell.end_col]);
            }
        }
    }

    fn table_line(_lines: &[&str], idx: usize) -> usize {
        idx
    }
}

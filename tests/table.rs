//! Black-box tests for the table/grid detector (spec.md §4.E, §8 scenarios
//! 5 and 6).

use magonote::table::{detect_tables, TableConfig};

#[test]
fn docker_ps_grid_resolves_to_a_multi_column_table_with_high_confidence() {
    let lines = [
        "CONTAINER ID   IMAGE          STATUS         NAMES",
        "a1b2c3d4e5f6   nginx:latest   Up 2 hours     web",
        "f6e5d4c3b2a1   redis:alpine   Up 3 hours     cache",
    ];
    let cfg = TableConfig::default();
    let tables = detect_tables(&lines, &cfg);
    assert!(!tables.is_empty());
    let t = &tables[0];
    assert_eq!(t.num_columns, 4);
    assert!(t.confidence >= 0.5);

    let header: Vec<&str> = t.cells.iter().filter(|c| c.line_index == 0).map(|c| c.text.as_str()).collect();
    assert_eq!(header.first(), Some(&"CONTAINER ID"));
    assert!(header.contains(&"IMAGE"));
}

#[test]
fn ls_alh_compound_header_is_not_split() {
    let lines = [
        "Permissions  Size  User    Date Modified      Name",
        "drwxr-xr-x   -     kumiko  2024-01-01T10:00   src",
        "drwxr-xr-x   -     kumiko  2024-01-02T11:00   docs",
    ];
    let cfg = TableConfig::default();
    let tables = detect_tables(&lines, &cfg);
    assert!(!tables.is_empty());
    let header: Vec<&str> = tables[0].cells.iter().filter(|c| c.line_index == 0).map(|c| c.text.as_str()).collect();
    assert!(header.contains(&"Date Modified"), "header cells: {header:?}");
}

#[test]
fn every_cell_falls_within_its_source_line() {
    let lines = ["one    two", "three  four"];
    let cfg = TableConfig::default();
    for table in detect_tables(&lines, &cfg) {
        for cell in &table.cells {
            assert!(cell.line_index < lines.len());
            assert_eq!(&lines[cell.line_index][cell.start_col..=cell.end_col], cell.text);
        }
    }
}

#[test]
fn single_line_input_yields_no_table() {
    let lines = ["just one line of text"];
    let cfg = TableConfig::default();
    assert!(detect_tables(&lines, &cfg).is_empty());
}

//! Tests for text module - the line model.

use xdb_io::TextFile;

#[test]
fn test_lines_without_terminators() {
    let text = "SELECT *\r\nFROM [CITI_STATS]..[TB_X]\r\n";
    let file = TextFile::parse(text, false);
    assert_eq!(file.line_count(), 2);
    assert_eq!(file.line(1), Some("FROM [CITI_STATS]..[TB_X]"));
    assert_eq!(file.render(), text);
}

#[test]
fn test_blank_lines_are_counted() {
    let file = TextFile::parse("a\n\n\nb\n", false);
    assert_eq!(file.line_count(), 4);
    assert_eq!(file.line(2), Some(""));
}

#[test]
fn test_no_terminator_is_not_added() {
    let mut file = TextFile::parse("single", true);
    assert!(file.has_bom());
    assert!(file.replace_line(0, "SINGLE"));
    assert_eq!(file.render(), "SINGLE");
}

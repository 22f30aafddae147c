//! Exact round-trip: any text that parses serializes back byte-identical.

use initext::ini::options::{
    CommentRule, DuplicateKeyRule, DuplicateSectionRule, EscapeSequenceRule, GlobalKeysRule,
    NameValueDelimiterRule, QuotationRule,
};
use initext::{Configuration, Options};

fn assert_roundtrip(options: &Options, source: &str) {
    let config = Configuration::from_text(options, source)
        .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e));
    assert_eq!(config.to_text(options), source, "round-trip of {:?}", source);
}

#[test]
fn empty_document() {
    assert_roundtrip(&Options::default(), "");
}

#[test]
fn plain_sections_and_keys() {
    assert_roundtrip(&Options::default(), "[a]\nx=1\ny=2\n\n[b]\nz=3\n");
}

#[test]
fn no_trailing_newline() {
    assert_roundtrip(&Options::default(), "[a]\nx=1");
}

#[test]
fn whitespace_is_preserved() {
    assert_roundtrip(
        &Options::default(),
        "[ padded ]\n   x   =   1   \n\t y\t=\t2\n",
    );
}

#[test]
fn crlf_line_endings_are_preserved() {
    assert_roundtrip(&Options::default(), "[a]\r\nx=1\r\n\r\ny=2\r\n");
}

#[test]
fn mixed_line_endings_are_preserved() {
    assert_roundtrip(&Options::default(), "[a]\r\nx=1\ny=2\r\n");
}

#[test]
fn comments_everywhere() {
    assert_roundtrip(
        &Options::default(),
        "# leading\n; also leading\n[a] ; heading trailer\nx=1  # key trailer\n# between\ny=2\n",
    );
}

#[test]
fn comment_markers_follow_the_rule() {
    // With hash-only comments a semicolon line is a key line, and still
    // round-trips
    let options = Options::default()
        .with_comment_rule(CommentRule::HashComments)
        .with_global_keys_rule(GlobalKeysRule::AllowGlobalKeys);
    assert_roundtrip(&options, "; not a comment\n# a comment\n");
}

#[test]
fn global_keys_document() {
    let options = Options::default().with_global_keys_rule(GlobalKeysRule::AllowGlobalKeys);
    assert_roundtrip(&options, "x=1\ny=2\n\n[a]\nz=3\n");
}

#[test]
fn duplicate_keys_keep_both_lines() {
    let options = Options::default()
        .with_duplicate_key_rule(DuplicateKeyRule::DuplicateKeyReplacesValue);
    let source = "[a]\nx=1\nx=2\n";
    let config = Configuration::from_text(&options, source).unwrap();
    // The superseded line stays in the tree even though the index only
    // reflects the final value
    assert_eq!(config.to_text(&options), source);
    assert_eq!(config.get("a", "x"), Some("2"));
}

#[test]
fn duplicate_sections_keep_both_blocks() {
    let options = Options::default()
        .with_duplicate_section_rule(DuplicateSectionRule::MergeDuplicateSectionIntoOriginal);
    assert_roundtrip(&options, "[a]\nx=1\n[a]\ny=2\n");
}

#[test]
fn quoted_values() {
    let options = Options::default().with_quotation_rule(QuotationRule::UseQuotation);
    assert_roundtrip(&options, "[a]\nx = \"  spaced  \"\ny = 'single'\n");
    let config =
        Configuration::from_text(&options, "[a]\nx = \"  spaced  \"\n").unwrap();
    assert_eq!(config.get("a", "x"), Some("  spaced  "));
}

#[test]
fn quotes_are_literal_when_ignored() {
    let options = Options::default();
    let source = "[a]\nx = \"v\"\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "x"), Some("\"v\""));
}

#[test]
fn escape_sequences_round_trip_raw() {
    let options = Options::default()
        .with_escape_sequence_rule(EscapeSequenceRule::UseEscapeSequences);
    let source = "[a]\nx=a\\nb\npath=c\\\\temp\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "x"), Some("a\nb"));
    assert_eq!(config.get("a", "path"), Some("c\\temp"));
}

#[test]
fn escaped_delimiter_in_key_name() {
    let options = Options::default()
        .with_escape_sequence_rule(EscapeSequenceRule::UseEscapeSequences);
    let source = "[a]\nkey\\=name=1\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "key=name"), Some("1"));
}

#[test]
fn line_continuation_joins_logical_lines() {
    let options = Options::default()
        .with_escape_sequence_rule(EscapeSequenceRule::UseEscapeSequencesAndLineContinuation);
    let source = "[a]\nx=first\\\nsecond\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "x"), Some("firstsecond"));
}

#[test]
fn colon_delimiter_documents() {
    let options = Options::default()
        .with_name_value_delimiter_rule(NameValueDelimiterRule::ColonDelimiter);
    let source = "[a]\nx: 1\ny : 2\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "x"), Some("1"));
}

#[test]
fn no_delimiter_documents() {
    let options = Options::default()
        .with_name_value_delimiter_rule(NameValueDelimiterRule::NoDelimiter);
    let source = "[a]\nkey value with spaces\nflag\n";
    assert_roundtrip(&options, source);
    let config = Configuration::from_text(&options, source).unwrap();
    assert_eq!(config.get("a", "key"), Some("value with spaces"));
    assert_eq!(config.get("a", "flag"), Some(""));
}

#[test]
fn blank_lines_and_trailing_comment_blocks() {
    assert_roundtrip(
        &Options::default(),
        "\n\n[a]\n\nx=1\n\n\n# trailing commentary\n",
    );
}

#[test]
fn value_with_equals_inside() {
    let source = "[a]\nquery=x=1&y=2\n";
    assert_roundtrip(&Options::default(), source);
    let config = Configuration::from_text(&Options::default(), source).unwrap();
    assert_eq!(config.get("a", "query"), Some("x=1&y=2"));
}

#[test]
fn unicode_content() {
    let source = "[übersicht]\nschlüssel=wört\n";
    assert_roundtrip(&Options::default(), source);
    let config = Configuration::from_text(&Options::default(), source).unwrap();
    assert_eq!(config.get("übersicht", "schlüssel"), Some("wört"));
}

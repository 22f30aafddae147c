//! Formatting of synthesized key lines under the delimiter, spacing,
//! preference, and quotation rules.

use rstest::rstest;

use initext::ini::options::{
    EscapeSequenceRule, NameValueDelimiterPreferenceRule, NameValueDelimiterRule,
    NameValueDelimiterSpacingRule, NewlineRule, QuotationRule,
};
use initext::{Configuration, Options};

fn base() -> Options {
    Options::default().with_newline_rule(NewlineRule::LfNewline)
}

fn added_line(options: &Options) -> String {
    let config = Configuration::empty()
        .add(options, "s", "key", "value")
        .expect("add succeeds");
    let text = config.to_text(options);
    let line = text
        .lines()
        .nth(1)
        .expect("section heading then key line");
    line.to_string()
}

#[rstest]
#[case(NameValueDelimiterSpacingRule::BothSides, "key = value")]
#[case(NameValueDelimiterSpacingRule::LeftOnly, "key =value")]
#[case(NameValueDelimiterSpacingRule::RightOnly, "key= value")]
#[case(NameValueDelimiterSpacingRule::NoSpacing, "key=value")]
fn spacing_rules(#[case] spacing: NameValueDelimiterSpacingRule, #[case] expected: &str) {
    let options = base().with_name_value_delimiter_spacing_rule(spacing);
    assert_eq!(added_line(&options), expected);
}

#[test]
fn equals_or_colon_with_colon_preference() {
    let options = base()
        .with_name_value_delimiter_rule(NameValueDelimiterRule::EqualsOrColonDelimiter)
        .with_name_value_delimiter_preference_rule(
            NameValueDelimiterPreferenceRule::PreferColonDelimiter,
        );
    assert_eq!(added_line(&options), "key : value");
}

#[test]
fn colon_delimiter_derives_colon_preference() {
    let options =
        base().with_name_value_delimiter_rule(NameValueDelimiterRule::ColonDelimiter);
    assert_eq!(added_line(&options), "key : value");
}

#[test]
fn no_delimiter_writes_a_single_separator_space() {
    let options = base().with_name_value_delimiter_rule(NameValueDelimiterRule::NoDelimiter);
    assert_eq!(added_line(&options), "key value");
}

#[test]
fn always_use_quotation_wraps_values() {
    let options = base().with_quotation_rule(QuotationRule::AlwaysUseQuotation);
    assert_eq!(added_line(&options), "key = \"value\"");
}

#[test]
fn use_quotation_quotes_only_when_needed() {
    let options = base().with_quotation_rule(QuotationRule::UseQuotation);
    assert_eq!(added_line(&options), "key = value");

    let config = Configuration::empty()
        .add(&options, "s", "key", "  padded  ")
        .unwrap();
    let text = config.to_text(&options);
    assert_eq!(text, "[s]\nkey = \"  padded  \"\n");
    // The quoted value reads back without its quotes
    let reread = Configuration::from_text(&options, &text).unwrap();
    assert_eq!(reread.get("s", "key"), Some("  padded  "));
}

#[test]
fn escapes_encode_specials_in_written_values() {
    let options =
        base().with_escape_sequence_rule(EscapeSequenceRule::UseEscapeSequences);
    let config = Configuration::empty()
        .add(&options, "s", "key", "a\nb")
        .unwrap();
    let text = config.to_text(&options);
    assert_eq!(text, "[s]\nkey = a\\nb\n");
    let reread = Configuration::from_text(&options, &text).unwrap();
    assert_eq!(reread.get("s", "key"), Some("a\nb"));
}

#[test]
fn crlf_newline_rule_applies_to_synthesized_lines() {
    let options = Options::default().with_newline_rule(NewlineRule::CrLfNewline);
    let config = Configuration::empty().add(&options, "s", "key", "value").unwrap();
    assert_eq!(config.to_text(&options), "[s]\r\nkey = value\r\n");
}

#[test]
fn newline_rule_resolves_at_serialization_time() {
    let lf = Options::default().with_newline_rule(NewlineRule::LfNewline);
    let crlf = Options::default().with_newline_rule(NewlineRule::CrLfNewline);
    // One configuration, two renderings: the synthesized line breaks follow
    // the options passed at serialization
    let config = Configuration::empty().add(&lf, "s", "key", "value").unwrap();
    assert_eq!(config.to_text(&lf), "[s]\nkey = value\n");
    assert_eq!(config.to_text(&crlf), "[s]\r\nkey = value\r\n");
}

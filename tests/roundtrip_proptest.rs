//! Property test: generated documents round-trip byte-identically.

use proptest::prelude::*;

use initext::ini::options::{
    DuplicateKeyRule, DuplicateSectionRule, GlobalKeysRule,
};
use initext::{Configuration, Options};

/// The most permissive dialect: nothing a generated document contains can
/// trip a policy error.
fn permissive() -> Options {
    Options::default()
        .with_global_keys_rule(GlobalKeysRule::AllowGlobalKeys)
        .with_duplicate_key_rule(DuplicateKeyRule::DuplicateKeyAddsValue)
        .with_duplicate_section_rule(DuplicateSectionRule::AllowDuplicateSections)
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    // No markers, delimiters, or quotes; interior spaces are fine
    "[a-z0-9][a-z0-9 ._/-]{0,10}[a-z0-9]|[a-z0-9]?"
}

fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        ("[#;]", "[ a-z0-9]{0,12}").prop_map(|(m, text)| format!("{}{}", m, text)),
        name_strategy().prop_map(|name| format!("[{}]", name)),
        (name_strategy(), "[ ]{0,2}", "[ ]{0,2}", value_strategy())
            .prop_map(|(key, left, right, value)| format!("{}{}={}{}", key, left, right, value)),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    (prop::collection::vec(line_strategy(), 0..12), any::<bool>()).prop_map(
        |(lines, trailing_newline)| {
            let mut text = lines.join("\n");
            if trailing_newline && !text.is_empty() {
                text.push('\n');
            }
            text
        },
    )
}

proptest! {
    #[test]
    fn generated_documents_roundtrip(source in document_strategy()) {
        let options = permissive();
        let config = Configuration::from_text(&options, &source)
            .expect("permissive dialect parses generated input");
        prop_assert_eq!(config.to_text(&options), source);
    }

    #[test]
    fn reserialization_is_a_fixed_point(source in document_strategy()) {
        let options = permissive();
        let once = Configuration::from_text(&options, &source)
            .expect("permissive dialect parses generated input")
            .to_text(&options);
        let twice = Configuration::from_text(&options, &once)
            .expect("serialized output parses")
            .to_text(&options);
        prop_assert_eq!(once, twice);
    }
}

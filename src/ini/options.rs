//! Dialect rules and the immutable `Options` record
//!
//! An INI dialect is fully described by ten independent rules, each a closed
//! enumeration. `Options` bundles one choice per rule. Two of the rules
//! (delimiter preference and delimiter spacing) have defaults that depend on
//! the chosen delimiter rule; they are stored as explicit overrides and
//! resolved through pure derivation functions when unset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which characters start a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentRule {
    HashComments,
    SemicolonComments,
    HashAndSemicolonComments,
}

/// Behavior when a key repeats within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyRule {
    DisallowDuplicateKeys,
    DuplicateKeyReplacesValue,
    DuplicateKeyAddsValue,
}

/// Behavior when a section heading repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateSectionRule {
    DisallowDuplicateSections,
    AllowDuplicateSections,
    MergeDuplicateSectionIntoOriginal,
    MergeOriginalSectionIntoDuplicate,
}

/// Whether backslash escape sequences are decoded in names and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscapeSequenceRule {
    IgnoreEscapeSequences,
    UseEscapeSequences,
    UseEscapeSequencesAndLineContinuation,
}

/// Whether keys may appear before any section heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalKeysRule {
    DisallowGlobalKeys,
    AllowGlobalKeys,
}

/// Which character separates a key name from its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameValueDelimiterRule {
    EqualsDelimiter,
    ColonDelimiter,
    EqualsOrColonDelimiter,
    NoDelimiter,
}

/// Which delimiter to write for synthesized keys when the delimiter rule
/// admits more than one spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameValueDelimiterPreferenceRule {
    PreferEqualsDelimiter,
    PreferColonDelimiter,
    PreferNoDelimiter,
}

/// Whitespace written around the delimiter of synthesized keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameValueDelimiterSpacingRule {
    BothSides,
    LeftOnly,
    RightOnly,
    NoSpacing,
}

/// Line ending written for synthesized line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewlineRule {
    DefaultEnvironmentNewline,
    LfNewline,
    CrLfNewline,
}

/// Whether quotation marks around values are significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotationRule {
    IgnoreQuotation,
    UseQuotation,
    AlwaysUseQuotation,
}

impl CommentRule {
    pub fn allows_hash(self) -> bool {
        matches!(
            self,
            CommentRule::HashComments | CommentRule::HashAndSemicolonComments
        )
    }

    pub fn allows_semicolon(self) -> bool {
        matches!(
            self,
            CommentRule::SemicolonComments | CommentRule::HashAndSemicolonComments
        )
    }

    /// The marker written for synthesized comments.
    pub fn preferred_marker(self) -> char {
        match self {
            CommentRule::SemicolonComments => ';',
            CommentRule::HashComments | CommentRule::HashAndSemicolonComments => '#',
        }
    }
}

impl NameValueDelimiterRule {
    pub fn accepts_equals(self) -> bool {
        matches!(
            self,
            NameValueDelimiterRule::EqualsDelimiter | NameValueDelimiterRule::EqualsOrColonDelimiter
        )
    }

    pub fn accepts_colon(self) -> bool {
        matches!(
            self,
            NameValueDelimiterRule::ColonDelimiter | NameValueDelimiterRule::EqualsOrColonDelimiter
        )
    }
}

impl NameValueDelimiterPreferenceRule {
    /// The default preference derived from the delimiter rule.
    pub fn derived_from(rule: NameValueDelimiterRule) -> Self {
        match rule {
            NameValueDelimiterRule::EqualsDelimiter
            | NameValueDelimiterRule::EqualsOrColonDelimiter => {
                NameValueDelimiterPreferenceRule::PreferEqualsDelimiter
            }
            NameValueDelimiterRule::ColonDelimiter => {
                NameValueDelimiterPreferenceRule::PreferColonDelimiter
            }
            NameValueDelimiterRule::NoDelimiter => {
                NameValueDelimiterPreferenceRule::PreferNoDelimiter
            }
        }
    }
}

impl NameValueDelimiterSpacingRule {
    /// The default spacing derived from the delimiter rule. Spacing disables
    /// itself when there is no delimiter to space around.
    pub fn derived_from(rule: NameValueDelimiterRule) -> Self {
        match rule {
            NameValueDelimiterRule::NoDelimiter => NameValueDelimiterSpacingRule::NoSpacing,
            _ => NameValueDelimiterSpacingRule::BothSides,
        }
    }
}

impl NewlineRule {
    /// The line ending this rule resolves to. `DefaultEnvironmentNewline`
    /// resolves at serialization time, not at parse time.
    pub fn as_str(self) -> &'static str {
        match self {
            NewlineRule::DefaultEnvironmentNewline => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            NewlineRule::LfNewline => "\n",
            NewlineRule::CrLfNewline => "\r\n",
        }
    }
}

impl EscapeSequenceRule {
    pub fn enabled(self) -> bool {
        !matches!(self, EscapeSequenceRule::IgnoreEscapeSequences)
    }

    pub fn allows_continuation(self) -> bool {
        matches!(self, EscapeSequenceRule::UseEscapeSequencesAndLineContinuation)
    }
}

impl QuotationRule {
    pub fn enabled(self) -> bool {
        !matches!(self, QuotationRule::IgnoreQuotation)
    }
}

/// An immutable bundle of the ten dialect rules.
///
/// Every `with_*` transform returns a new value; no shared instance is ever
/// mutated. The delimiter preference and spacing rules are resolved lazily:
/// unless explicitly overridden they derive from the delimiter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    comment_rule: CommentRule,
    duplicate_key_rule: DuplicateKeyRule,
    duplicate_section_rule: DuplicateSectionRule,
    escape_sequence_rule: EscapeSequenceRule,
    global_keys_rule: GlobalKeysRule,
    name_value_delimiter_rule: NameValueDelimiterRule,
    name_value_delimiter_preference_rule: Option<NameValueDelimiterPreferenceRule>,
    name_value_delimiter_spacing_rule: Option<NameValueDelimiterSpacingRule>,
    newline_rule: NewlineRule,
    quotation_rule: QuotationRule,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comment_rule: CommentRule::HashAndSemicolonComments,
            duplicate_key_rule: DuplicateKeyRule::DisallowDuplicateKeys,
            duplicate_section_rule: DuplicateSectionRule::DisallowDuplicateSections,
            escape_sequence_rule: EscapeSequenceRule::IgnoreEscapeSequences,
            global_keys_rule: GlobalKeysRule::DisallowGlobalKeys,
            name_value_delimiter_rule: NameValueDelimiterRule::EqualsDelimiter,
            name_value_delimiter_preference_rule: None,
            name_value_delimiter_spacing_rule: None,
            newline_rule: NewlineRule::DefaultEnvironmentNewline,
            quotation_rule: QuotationRule::IgnoreQuotation,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    pub fn comment_rule(&self) -> CommentRule {
        self.comment_rule
    }

    pub fn duplicate_key_rule(&self) -> DuplicateKeyRule {
        self.duplicate_key_rule
    }

    pub fn duplicate_section_rule(&self) -> DuplicateSectionRule {
        self.duplicate_section_rule
    }

    pub fn escape_sequence_rule(&self) -> EscapeSequenceRule {
        self.escape_sequence_rule
    }

    pub fn global_keys_rule(&self) -> GlobalKeysRule {
        self.global_keys_rule
    }

    pub fn name_value_delimiter_rule(&self) -> NameValueDelimiterRule {
        self.name_value_delimiter_rule
    }

    /// The preference rule, falling back to the delimiter-derived default.
    pub fn name_value_delimiter_preference_rule(&self) -> NameValueDelimiterPreferenceRule {
        self.name_value_delimiter_preference_rule
            .unwrap_or_else(|| {
                NameValueDelimiterPreferenceRule::derived_from(self.name_value_delimiter_rule)
            })
    }

    /// The spacing rule, falling back to the delimiter-derived default.
    pub fn name_value_delimiter_spacing_rule(&self) -> NameValueDelimiterSpacingRule {
        self.name_value_delimiter_spacing_rule.unwrap_or_else(|| {
            NameValueDelimiterSpacingRule::derived_from(self.name_value_delimiter_rule)
        })
    }

    pub fn newline_rule(&self) -> NewlineRule {
        self.newline_rule
    }

    pub fn quotation_rule(&self) -> QuotationRule {
        self.quotation_rule
    }

    pub fn with_comment_rule(mut self, rule: CommentRule) -> Self {
        self.comment_rule = rule;
        self
    }

    pub fn with_duplicate_key_rule(mut self, rule: DuplicateKeyRule) -> Self {
        self.duplicate_key_rule = rule;
        self
    }

    pub fn with_duplicate_section_rule(mut self, rule: DuplicateSectionRule) -> Self {
        self.duplicate_section_rule = rule;
        self
    }

    pub fn with_escape_sequence_rule(mut self, rule: EscapeSequenceRule) -> Self {
        self.escape_sequence_rule = rule;
        self
    }

    pub fn with_global_keys_rule(mut self, rule: GlobalKeysRule) -> Self {
        self.global_keys_rule = rule;
        self
    }

    /// Changing the delimiter rule re-derives the preference and spacing
    /// defaults unless they were explicitly overridden.
    pub fn with_name_value_delimiter_rule(mut self, rule: NameValueDelimiterRule) -> Self {
        self.name_value_delimiter_rule = rule;
        self
    }

    pub fn with_name_value_delimiter_preference_rule(
        mut self,
        rule: NameValueDelimiterPreferenceRule,
    ) -> Self {
        self.name_value_delimiter_preference_rule = Some(rule);
        self
    }

    pub fn with_name_value_delimiter_spacing_rule(
        mut self,
        rule: NameValueDelimiterSpacingRule,
    ) -> Self {
        self.name_value_delimiter_spacing_rule = Some(rule);
        self
    }

    pub fn with_newline_rule(mut self, rule: NewlineRule) -> Self {
        self.newline_rule = rule;
        self
    }

    pub fn with_quotation_rule(mut self, rule: QuotationRule) -> Self {
        self.quotation_rule = rule;
        self
    }
}

/// Error returned when a rule name does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRuleName {
    pub rule: &'static str,
    pub name: String,
}

impl fmt::Display for UnknownRuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} name: {:?}", self.rule, self.name)
    }
}

impl std::error::Error for UnknownRuleName {}

macro_rules! rule_names {
    ($rule:ident, $label:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $rule {
            type Err = UnknownRuleName;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($rule::$variant),)+
                    _ => Err(UnknownRuleName {
                        rule: $label,
                        name: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $rule {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = match self {
                    $($rule::$variant => $name,)+
                };
                f.write_str(name)
            }
        }
    };
}

rule_names!(CommentRule, "comment rule", {
    "HashComments" => HashComments,
    "SemicolonComments" => SemicolonComments,
    "HashAndSemicolonComments" => HashAndSemicolonComments,
});

rule_names!(DuplicateKeyRule, "duplicate key rule", {
    "DisallowDuplicateKeys" => DisallowDuplicateKeys,
    "DuplicateKeyReplacesValue" => DuplicateKeyReplacesValue,
    "DuplicateKeyAddsValue" => DuplicateKeyAddsValue,
});

rule_names!(DuplicateSectionRule, "duplicate section rule", {
    "DisallowDuplicateSections" => DisallowDuplicateSections,
    "AllowDuplicateSections" => AllowDuplicateSections,
    "MergeDuplicateSectionIntoOriginal" => MergeDuplicateSectionIntoOriginal,
    "MergeOriginalSectionIntoDuplicate" => MergeOriginalSectionIntoDuplicate,
});

rule_names!(EscapeSequenceRule, "escape sequence rule", {
    "IgnoreEscapeSequences" => IgnoreEscapeSequences,
    "UseEscapeSequences" => UseEscapeSequences,
    "UseEscapeSequencesAndLineContinuation" => UseEscapeSequencesAndLineContinuation,
});

rule_names!(GlobalKeysRule, "global keys rule", {
    "DisallowGlobalKeys" => DisallowGlobalKeys,
    "AllowGlobalKeys" => AllowGlobalKeys,
});

rule_names!(NameValueDelimiterRule, "name value delimiter rule", {
    "EqualsDelimiter" => EqualsDelimiter,
    "ColonDelimiter" => ColonDelimiter,
    "EqualsOrColonDelimiter" => EqualsOrColonDelimiter,
    "NoDelimiter" => NoDelimiter,
});

rule_names!(
    NameValueDelimiterPreferenceRule,
    "name value delimiter preference rule",
    {
        "PreferEqualsDelimiter" => PreferEqualsDelimiter,
        "PreferColonDelimiter" => PreferColonDelimiter,
        "PreferNoDelimiter" => PreferNoDelimiter,
    }
);

rule_names!(
    NameValueDelimiterSpacingRule,
    "name value delimiter spacing rule",
    {
        "BothSides" => BothSides,
        "LeftOnly" => LeftOnly,
        "RightOnly" => RightOnly,
        "NoSpacing" => NoSpacing,
    }
);

rule_names!(NewlineRule, "newline rule", {
    "DefaultEnvironmentNewline" => DefaultEnvironmentNewline,
    "LfNewline" => LfNewline,
    "CrLfNewline" => CrLfNewline,
});

rule_names!(QuotationRule, "quotation rule", {
    "IgnoreQuotation" => IgnoreQuotation,
    "UseQuotation" => UseQuotation,
    "AlwaysUseQuotation" => AlwaysUseQuotation,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_transforms_leave_original_untouched() {
        let base = Options::default();
        let changed = base
            .clone()
            .with_comment_rule(CommentRule::HashComments)
            .with_global_keys_rule(GlobalKeysRule::AllowGlobalKeys);

        assert_eq!(
            base.comment_rule(),
            CommentRule::HashAndSemicolonComments
        );
        assert_eq!(changed.comment_rule(), CommentRule::HashComments);
        assert_eq!(changed.global_keys_rule(), GlobalKeysRule::AllowGlobalKeys);
    }

    #[test]
    fn preference_derives_from_delimiter_rule() {
        let colon = Options::default()
            .with_name_value_delimiter_rule(NameValueDelimiterRule::ColonDelimiter);
        assert_eq!(
            colon.name_value_delimiter_preference_rule(),
            NameValueDelimiterPreferenceRule::PreferColonDelimiter
        );

        let none =
            Options::default().with_name_value_delimiter_rule(NameValueDelimiterRule::NoDelimiter);
        assert_eq!(
            none.name_value_delimiter_preference_rule(),
            NameValueDelimiterPreferenceRule::PreferNoDelimiter
        );
        assert_eq!(
            none.name_value_delimiter_spacing_rule(),
            NameValueDelimiterSpacingRule::NoSpacing
        );
    }

    #[test]
    fn explicit_preference_survives_delimiter_change() {
        let options = Options::default()
            .with_name_value_delimiter_preference_rule(
                NameValueDelimiterPreferenceRule::PreferColonDelimiter,
            )
            .with_name_value_delimiter_rule(NameValueDelimiterRule::EqualsOrColonDelimiter);
        assert_eq!(
            options.name_value_delimiter_preference_rule(),
            NameValueDelimiterPreferenceRule::PreferColonDelimiter
        );
    }

    #[test]
    fn rule_names_round_trip() {
        let rule: DuplicateKeyRule = "DuplicateKeyAddsValue".parse().unwrap();
        assert_eq!(rule, DuplicateKeyRule::DuplicateKeyAddsValue);
        assert_eq!(rule.to_string(), "DuplicateKeyAddsValue");

        let err = "NotARule".parse::<CommentRule>().unwrap_err();
        assert_eq!(err.name, "NotARule");
    }
}

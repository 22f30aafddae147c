//! Command-line interface for initext
//! This binary is used to inspect INI-dialect files: round-trip print them,
//! dump the syntax tree, dump the section index, or read a value.
//!
//! Usage:
//!   initext print `<path>`                      - Parse and write the file back out
//!   initext tree `<path>`                       - Dump the syntax tree
//!   initext json `<path>`                       - Dump the section index as JSON
//!   initext get `<path>` `<section>` [`<key>`]  - Read a value (or list a section's keys)
//!
//! The ten dialect rules are selected with long flags (e.g.
//! `--duplicate-key-rule DuplicateKeyAddsValue`); omitted flags use the
//! default dialect.

use std::io::Read;
use std::str::FromStr;

use clap::{Arg, ArgMatches, Command};

use initext::ini::options::{
    CommentRule, DuplicateKeyRule, DuplicateSectionRule, EscapeSequenceRule, GlobalKeysRule,
    NameValueDelimiterPreferenceRule, NameValueDelimiterRule, NameValueDelimiterSpacingRule,
    NewlineRule, QuotationRule,
};
use initext::{Configuration, Options};

fn main() {
    let matches = Command::new("initext")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting INI-dialect configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(rule_args())
        .subcommand(
            Command::new("print").about("Parse a file and write it back out").arg(path_arg()),
        )
        .subcommand(Command::new("tree").about("Dump the syntax tree").arg(path_arg()))
        .subcommand(
            Command::new("json")
                .about("Dump the section index as JSON")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("get")
                .about("Read a value, or list a section's keys")
                .arg(path_arg())
                .arg(
                    Arg::new("section")
                        .help("The section name")
                        .required(true)
                        .index(2),
                )
                .arg(Arg::new("key").help("The key name").index(3)),
        )
        .get_matches();

    let options = match options_from_matches(&matches) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(2);
        }
    };

    match matches.subcommand() {
        Some(("print", sub)) => {
            let config = load(&options, path_of(sub));
            print!("{}", config.to_text(&options));
        }
        Some(("tree", sub)) => {
            let config = load(&options, path_of(sub));
            print!("{}", config.to_treeviz());
        }
        Some(("json", sub)) => {
            let config = load(&options, path_of(sub));
            match serde_json::to_string_pretty(config.index()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(("get", sub)) => {
            let config = load(&options, path_of(sub));
            let section = sub.get_one::<String>("section").map(String::as_str).unwrap_or("");
            match sub.get_one::<String>("key") {
                Some(key) => match config.get(section, key) {
                    Some(value) => println!("{}", value),
                    None => {
                        eprintln!("Error: key {:?} not found in section {:?}", key, section);
                        std::process::exit(1);
                    }
                },
                None => match config.keys(section) {
                    Some(keys) => {
                        for key in keys {
                            println!("{}", key);
                        }
                    }
                    None => {
                        eprintln!("Error: section {:?} not found", section);
                        std::process::exit(1);
                    }
                },
            }
        }
        _ => unreachable!(),
    }
}

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the configuration file, or '-' for standard input")
        .required(true)
        .index(1)
}

fn path_of(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or("-")
}

/// Read and parse the input, exiting with a message on failure.
fn load(options: &Options, path: &str) -> Configuration {
    let result = if path == "-" {
        let mut stdin = std::io::stdin();
        let mut buffer = Vec::new();
        match stdin.read_to_end(&mut buffer) {
            Ok(_) => Configuration::from_text(
                options,
                &String::from_utf8_lossy(&buffer),
            )
            .map_err(Into::into),
            Err(e) => Err(e.into()),
        }
    } else {
        Configuration::from_file(options, path)
    };
    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn rule_args() -> Vec<Arg> {
    let flag = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).global(true).help(help)
    };
    vec![
        flag("comment-rule", "Comment rule"),
        flag("duplicate-key-rule", "Duplicate key rule"),
        flag("duplicate-section-rule", "Duplicate section rule"),
        flag("escape-sequence-rule", "Escape sequence rule"),
        flag("global-keys-rule", "Global keys rule"),
        flag("name-value-delimiter-rule", "Name value delimiter rule"),
        flag(
            "name-value-delimiter-preference-rule",
            "Name value delimiter preference rule",
        ),
        flag(
            "name-value-delimiter-spacing-rule",
            "Name value delimiter spacing rule",
        ),
        flag("newline-rule", "Newline rule"),
        flag("quotation-rule", "Quotation rule"),
    ]
}

fn rule_of<R: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<R>, String>
where
    R::Err: std::fmt::Display,
{
    match matches.get_one::<String>(name) {
        None => Ok(None),
        Some(text) => text.parse::<R>().map(Some).map_err(|e| e.to_string()),
    }
}

fn options_from_matches(matches: &ArgMatches) -> Result<Options, String> {
    let mut options = Options::default();
    if let Some(rule) = rule_of::<CommentRule>(matches, "comment-rule")? {
        options = options.with_comment_rule(rule);
    }
    if let Some(rule) = rule_of::<DuplicateKeyRule>(matches, "duplicate-key-rule")? {
        options = options.with_duplicate_key_rule(rule);
    }
    if let Some(rule) = rule_of::<DuplicateSectionRule>(matches, "duplicate-section-rule")? {
        options = options.with_duplicate_section_rule(rule);
    }
    if let Some(rule) = rule_of::<EscapeSequenceRule>(matches, "escape-sequence-rule")? {
        options = options.with_escape_sequence_rule(rule);
    }
    if let Some(rule) = rule_of::<GlobalKeysRule>(matches, "global-keys-rule")? {
        options = options.with_global_keys_rule(rule);
    }
    if let Some(rule) =
        rule_of::<NameValueDelimiterRule>(matches, "name-value-delimiter-rule")?
    {
        options = options.with_name_value_delimiter_rule(rule);
    }
    if let Some(rule) = rule_of::<NameValueDelimiterPreferenceRule>(
        matches,
        "name-value-delimiter-preference-rule",
    )? {
        options = options.with_name_value_delimiter_preference_rule(rule);
    }
    if let Some(rule) = rule_of::<NameValueDelimiterSpacingRule>(
        matches,
        "name-value-delimiter-spacing-rule",
    )? {
        options = options.with_name_value_delimiter_spacing_rule(rule);
    }
    if let Some(rule) = rule_of::<NewlineRule>(matches, "newline-rule")? {
        options = options.with_newline_rule(rule);
    }
    if let Some(rule) = rule_of::<QuotationRule>(matches, "quotation-rule")? {
        options = options.with_quotation_rule(rule);
    }
    Ok(options)
}

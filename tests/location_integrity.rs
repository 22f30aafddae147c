//! Every node's span must map to the exact text range it occupies.

use initext::ini::options::GlobalKeysRule;
use initext::{Configuration, Node, NodeId, Options, Position};

/// Extract the text a span covers from the serialized document.
fn slice_span(text: &str, start: Position, end: Position) -> String {
    let mut out = String::new();
    for (line_no, line) in text.split_inclusive('\n').enumerate() {
        if line_no < start.line || line_no > end.line {
            continue;
        }
        let from = if line_no == start.line { start.column } else { 0 };
        let to = if line_no == end.line {
            end.column
        } else {
            line.chars().count()
        };
        out.extend(line.chars().skip(from).take(to.saturating_sub(from)));
    }
    out
}

fn validate_node(config: &Configuration, text: &str, id: NodeId) {
    let node: &Node = config.node(id).expect("node is reachable");
    let span = &node.span;
    assert!(
        span.start <= span.end,
        "invalid span ordering on {:?}",
        node.kind
    );

    // A leaf's span must select exactly the text it renders
    match &node.kind {
        initext::ini::ast::NodeKind::Token { text: leaf } => {
            assert_eq!(slice_span(text, span.start, span.end), leaf.as_str());
        }
        initext::ini::ast::NodeKind::ReplaceableToken { raw, .. } => {
            assert_eq!(slice_span(text, span.start, span.end), raw.as_str());
        }
        _ => {}
    }

    let mut cursor = span.start;
    for child in &node.children {
        let child_span = config.node(*child).expect("child is reachable").span;
        assert!(
            cursor <= child_span.start,
            "children overlap or run backwards in {:?}",
            node.kind
        );
        assert!(
            child_span.end <= span.end,
            "child escapes parent span in {:?}",
            node.kind
        );
        cursor = child_span.end;
        validate_node(config, text, *child);
    }
}

fn validate_document(options: &Options, source: &str) {
    let config = Configuration::from_text(options, source).expect("source parses");
    let text = config.to_text(options);
    assert_eq!(text, source);
    validate_node(&config, &text, config.root());

    let root_span = config.node(config.root()).expect("root").span;
    assert_eq!(root_span.start, Position::new(0, 0));
}

#[test]
fn spans_are_nested_and_ordered() {
    validate_document(
        &Options::default(),
        "# intro\n[a]\n  x = 1  ; note\n\ny=2\n\n[ b ]\nz = 3\n",
    );
}

#[test]
fn spans_cover_global_keys() {
    let options = Options::default().with_global_keys_rule(GlobalKeysRule::AllowGlobalKeys);
    validate_document(&options, "x=1\n\n[a]\ny=2\n");
}

#[test]
fn key_node_span_selects_its_line() {
    let source = "[a]\nx = 1\ny = 2\n";
    let config = Configuration::from_text(&Options::default(), source).unwrap();

    let key = config.key_node("a", "y").expect("y exists");
    let node = config.node(key).expect("key node");
    assert_eq!(node.position(), Position::new(2, 0));
    assert_eq!(node.end_position(), Position::new(3, 0));
    assert_eq!(slice_span(source, node.position(), node.end_position()), "y = 2\n");
}

#[test]
fn key_name_span_selects_the_name_token() {
    let source = "[a]\n  key = value\n";
    let config = Configuration::from_text(&Options::default(), source).unwrap();

    let key = config.key_node("a", "key").expect("key exists");
    let name_id = config
        .node(key)
        .expect("key node")
        .children
        .iter()
        .copied()
        .find(|c| {
            matches!(
                config.node(*c).expect("child").kind,
                initext::ini::ast::NodeKind::KeyName { .. }
            )
        })
        .expect("key has a name node");
    let name = config.node(name_id).expect("name node");
    assert_eq!(slice_span(source, name.position(), name.end_position()), "key");
}

#[test]
fn spans_shift_after_edits() {
    let options = Options::default()
        .with_newline_rule(initext::ini::options::NewlineRule::LfNewline);
    let config = Configuration::from_text(&options, "[a]\nx=1\ny=2\n").unwrap();
    let edited = config.add(&options, "a", "w", "0").unwrap();
    let text = edited.to_text(&options);

    let key = edited.key_node("a", "y").expect("y exists");
    let node = edited.node(key).expect("key node");
    assert_eq!(
        slice_span(&text, node.position(), node.end_position()),
        "y=2\n"
    );
    validate_node(&edited, &text, edited.root());
}

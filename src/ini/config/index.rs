//! The derived configuration index
//!
//! A read-optimized view over the tree: section name to `KeyMap`, an
//! ordered mapping from key name to the ordered list of recorded values,
//! each tagged with the key node that carries it. The index is rebuilt from
//! the tree after parsing and after every mutation, so the two never
//! disagree. Duplicate-key and duplicate-section policies apply here; the
//! tree itself always keeps every source line.

use serde::Serialize;

use crate::ini::ast::{Arena, NodeId, NodeKind, ParseError, Position};
use crate::ini::options::{DuplicateKeyRule, DuplicateSectionRule, Options};

/// Reserved name of the section holding keys that appear before any
/// heading.
pub const GLOBAL_SECTION: &str = "<global>";

/// One recorded value and the key node that carries it.
pub type ValueEntry = (String, NodeId);

/// The ordered keys of one logical section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMap {
    entries: Vec<KeyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyEntry {
    pub name: String,
    pub values: Vec<ValueEntry>,
}

impl KeyMap {
    pub fn get(&self, name: &str) -> Option<&KeyEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last recorded value of a key.
    pub fn last_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|entry| entry.values.last())
            .map(|(value, _)| value.as_str())
    }

    /// The first recorded value of a key.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|entry| entry.values.first())
            .map(|(value, _)| value.as_str())
    }
}

/// One logical section: its key map and the tree nodes backing it (several
/// under `AllowDuplicateSections`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionEntry {
    pub name: String,
    pub key_map: KeyMap,
    pub nodes: Vec<NodeId>,
}

/// The full section index, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Index {
    sections: Vec<SectionEntry>,
}

impl Index {
    pub fn section(&self, name: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|entry| entry.name == name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionEntry> + '_ {
        self.sections.iter()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections.iter().map(|entry| entry.name.as_str())
    }
}

/// A key occurrence collected from the tree.
struct RawKey {
    name: String,
    value: String,
    node: NodeId,
    at: Position,
}

/// One `Section` node and the keys recorded inside it.
struct Occurrence {
    name: String,
    node: NodeId,
    heading_at: Position,
    keys: Vec<RawKey>,
}

/// Build the index for the tree rooted at `root`. Fails where the active
/// duplicate policies disallow the recorded content; positions refer to the
/// laid-out document (1-based).
pub fn build(options: &Options, arena: &Arena, root: NodeId) -> Result<Index, ParseError> {
    let occurrences = collect_occurrences(arena, root);

    match options.duplicate_section_rule() {
        DuplicateSectionRule::DisallowDuplicateSections => {
            for (i, occ) in occurrences.iter().enumerate() {
                if occurrences[..i].iter().any(|prev| prev.name == occ.name) {
                    return Err(ParseError::DisallowedDuplicateSection {
                        section: occ.name.clone(),
                        line: occ.heading_at.line + 1,
                        column: occ.heading_at.column + 1,
                    });
                }
            }
            build_merged(options, occurrences, false)
        }
        DuplicateSectionRule::AllowDuplicateSections => build_concatenated(options, occurrences),
        DuplicateSectionRule::MergeDuplicateSectionIntoOriginal => {
            build_merged(options, occurrences, false)
        }
        DuplicateSectionRule::MergeOriginalSectionIntoDuplicate => {
            build_merged(options, occurrences, true)
        }
    }
}

fn collect_occurrences(arena: &Arena, root: NodeId) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for child in &arena.node(root).children {
        let node = arena.node(*child);
        let NodeKind::Section { name } = &node.kind else {
            continue;
        };
        let heading_at = arena
            .section_heading(*child)
            .map(|h| arena.node(h).span.start)
            .unwrap_or(node.span.start);
        let mut keys = Vec::new();
        for item in &node.children {
            let item_node = arena.node(*item);
            if !matches!(item_node.kind, NodeKind::Key) {
                continue;
            }
            let Some(name_id) = arena.key_name(*item) else {
                continue;
            };
            let NodeKind::KeyName { name: key_name } = &arena.node(name_id).kind else {
                continue;
            };
            let value = match arena.key_value(*item).map(|v| &arena.node(v).kind) {
                Some(NodeKind::KeyValue { value }) => value.clone(),
                _ => String::new(),
            };
            keys.push(RawKey {
                name: key_name.clone(),
                value,
                node: *item,
                at: item_node.span.start,
            });
        }
        occurrences.push(Occurrence {
            name: name.clone(),
            node: *child,
            heading_at,
            keys,
        });
    }
    occurrences
}

/// Fold a key occurrence list into a `KeyMap` under the duplicate key rule.
fn apply_key_rule(rule: DuplicateKeyRule, keys: &[&RawKey]) -> Result<KeyMap, ParseError> {
    let mut map = KeyMap::default();
    for key in keys {
        match map.entries.iter_mut().find(|entry| entry.name == key.name) {
            None => map.entries.push(KeyEntry {
                name: key.name.clone(),
                values: vec![(key.value.clone(), key.node)],
            }),
            Some(entry) => match rule {
                DuplicateKeyRule::DisallowDuplicateKeys => {
                    return Err(ParseError::DisallowedDuplicateKey {
                        key: key.name.clone(),
                        line: key.at.line + 1,
                        column: key.at.column + 1,
                    });
                }
                DuplicateKeyRule::DuplicateKeyReplacesValue => {
                    entry.values = vec![(key.value.clone(), key.node)];
                }
                DuplicateKeyRule::DuplicateKeyAddsValue => {
                    entry.values.push((key.value.clone(), key.node));
                }
            },
        }
    }
    Ok(map)
}

/// Merge policy: one logical section per name; key lists of all occurrences
/// are folded together under the key rule. `later_first` folds the original
/// occurrence into the duplicate instead of the other way around.
fn build_merged(
    options: &Options,
    occurrences: Vec<Occurrence>,
    later_first: bool,
) -> Result<Index, ParseError> {
    let mut index = Index::default();
    for occ in &occurrences {
        if index.section(&occ.name).is_none() {
            index.sections.push(SectionEntry {
                name: occ.name.clone(),
                key_map: KeyMap::default(),
                nodes: Vec::new(),
            });
        }
    }
    for entry in &mut index.sections {
        let mut group: Vec<&Occurrence> = occurrences
            .iter()
            .filter(|occ| occ.name == entry.name)
            .collect();
        if later_first {
            group.reverse();
        }
        let keys: Vec<&RawKey> = group.iter().flat_map(|occ| occ.keys.iter()).collect();
        entry.key_map = apply_key_rule(options.duplicate_key_rule(), &keys)?;
        // Backing nodes stay in document order either way
        entry.nodes = occurrences
            .iter()
            .filter(|occ| occ.name == entry.name)
            .map(|occ| occ.node)
            .collect();
    }
    Ok(index)
}

/// Allow policy: every occurrence keeps its own key map (the key rule
/// applies within an occurrence); buckets with the same name concatenate in
/// document order, so a key present in two occurrences reads as
/// multi-valued.
fn build_concatenated(options: &Options, occurrences: Vec<Occurrence>) -> Result<Index, ParseError> {
    let mut index = Index::default();
    for occ in occurrences {
        let keys: Vec<&RawKey> = occ.keys.iter().collect();
        let map = apply_key_rule(options.duplicate_key_rule(), &keys)?;
        match index.sections.iter_mut().find(|e| e.name == occ.name) {
            None => index.sections.push(SectionEntry {
                name: occ.name,
                key_map: map,
                nodes: vec![occ.node],
            }),
            Some(entry) => {
                entry.nodes.push(occ.node);
                for incoming in map.entries {
                    match entry
                        .key_map
                        .entries
                        .iter_mut()
                        .find(|e| e.name == incoming.name)
                    {
                        None => entry.key_map.entries.push(incoming),
                        Some(existing) => existing.values.extend(incoming.values),
                    }
                }
            }
        }
    }
    Ok(index)
}

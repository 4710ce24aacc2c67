//! Canonical trees over key/value mappings.
//!
//! A mapping is first normalised into nested entries, then hashed bottom-up:
//! every value is a leaf, every mapping with two or more entries is an
//! internal node whose children are sorted by digest, and a mapping with a
//! single entry is represented by that entry. Sorting by digest makes the
//! root independent of key order.
//!
//! Keys only shape the tree; they are never hashed. `{"x": "1", "y": "2"}`
//! and `{"p": "2", "q": "1"}` share a root, so a root commits to the values
//! and their nesting but not to the names they are stored under.

use tracing::debug;

use super::node::MerkleNode;
use super::types::{Digest, NodeIndex};
use crate::hash::Algorithm;

/// How keys of a mapping passed to `from_dict` are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictFormat {
    /// Keys are dotted paths (`"a.c.b"`) expanded into nested mappings.
    #[default]
    Flatten,
    /// Keys are used verbatim; nesting comes from mapping values.
    Nested,
}

/// Value stored under a mapping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictValue {
    /// Raw bytes, hashed as-is.
    Bytes(Vec<u8>),
    /// Text, hashed as its UTF-8 encoding.
    Text(String),
    /// Nested mapping in insertion order.
    Map(Vec<(String, DictValue)>),
}

impl DictValue {
    /// Builds a nested mapping value.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DictValue>,
    {
        DictValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<&str> for DictValue {
    fn from(value: &str) -> Self {
        DictValue::Text(value.to_string())
    }
}

impl From<String> for DictValue {
    fn from(value: String) -> Self {
        DictValue::Text(value)
    }
}

impl From<&[u8]> for DictValue {
    fn from(value: &[u8]) -> Self {
        DictValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for DictValue {
    fn from(value: Vec<u8>) -> Self {
        DictValue::Bytes(value)
    }
}

/// Objects become mappings and strings become text; any other JSON value is
/// hashed as its compact JSON text.
impl From<serde_json::Value> for DictValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => DictValue::map(map),
            serde_json::Value::String(text) => DictValue::Text(text),
            other => DictValue::Text(other.to_string()),
        }
    }
}

/// Normalised mapping: keys unique per level, first assignment kept.
///
/// Mappings live in a flat arena; slot `0` is the top-level mapping and every
/// nested mapping refers to its entries by slot index.
#[derive(Debug)]
pub(crate) struct Entries {
    slots: Vec<Entry>,
}

#[derive(Debug)]
enum Entry {
    Value(Vec<u8>),
    Map(Vec<(String, usize)>),
}

const TOP: usize = 0;

impl Default for Entries {
    fn default() -> Self {
        Self {
            slots: vec![Entry::Map(Vec::new())],
        }
    }
}

impl Entries {
    /// Normalises caller entries according to `format`.
    pub(crate) fn collect<I>(entries: I, format: DictFormat) -> Self
    where
        I: IntoIterator<Item = (String, DictValue)>,
    {
        let mut root = Entries::default();
        for (key, value) in entries {
            match format {
                DictFormat::Flatten => {
                    let path: Vec<String> = key.split('.').map(str::to_string).collect();
                    root.insert_flattened(path, value);
                }
                DictFormat::Nested => root.insert_nested(key, value),
            }
        }
        root
    }

    fn lookup(&self, map: usize, key: &str) -> Option<usize> {
        match &self.slots[map] {
            Entry::Map(children) => children
                .iter()
                .find(|(existing, _)| existing == key)
                .map(|&(_, slot)| slot),
            Entry::Value(_) => None,
        }
    }

    fn attach(&mut self, map: usize, key: String, entry: Entry) -> usize {
        let slot = self.slots.len();
        self.slots.push(entry);
        if let Entry::Map(children) = &mut self.slots[map] {
            children.push((key, slot));
        }
        slot
    }

    /// Nested mappings extend the dotted path of their parent key.
    fn insert_flattened(&mut self, path: Vec<String>, value: DictValue) {
        let mut pending = vec![(path, value)];
        while let Some((path, value)) = pending.pop() {
            match value {
                DictValue::Map(children) => {
                    for (key, child) in children.into_iter().rev() {
                        let mut extended = path.clone();
                        extended.extend(key.split('.').map(str::to_string));
                        pending.push((extended, child));
                    }
                }
                leaf => self.insert_path(path, into_bytes(leaf)),
            }
        }
    }

    fn insert_path(&mut self, path: Vec<String>, bytes: Vec<u8>) {
        let last = path.len().saturating_sub(1);
        let mut map = TOP;
        for (depth, segment) in path.into_iter().enumerate() {
            match (self.lookup(map, &segment), depth == last) {
                (None, true) => {
                    self.attach(map, segment, Entry::Value(bytes));
                    return;
                }
                (None, false) => map = self.attach(map, segment, Entry::Map(Vec::new())),
                (Some(slot), false) => match self.slots[slot] {
                    Entry::Map(_) => map = slot,
                    Entry::Value(_) => {
                        debug!(key = %segment, "dropping path through existing value");
                        return;
                    }
                },
                (Some(_), true) => {
                    debug!(key = %segment, "dropping duplicate key");
                    return;
                }
            }
        }
    }

    fn insert_nested(&mut self, key: String, value: DictValue) {
        let mut pending = vec![(TOP, key, value)];
        while let Some((map, key, value)) = pending.pop() {
            if self.lookup(map, &key).is_some() {
                debug!(key = %key, "dropping duplicate key");
                continue;
            }
            match value {
                DictValue::Map(children) => {
                    let slot = self.attach(map, key, Entry::Map(Vec::new()));
                    for (child_key, child) in children.into_iter().rev() {
                        pending.push((slot, child_key, child));
                    }
                }
                leaf => {
                    self.attach(map, key, Entry::Value(into_bytes(leaf)));
                }
            }
        }
    }
}

fn into_bytes(value: DictValue) -> Vec<u8> {
    match value {
        DictValue::Bytes(bytes) => bytes,
        DictValue::Text(text) => text.into_bytes(),
        // Callers expand mappings before reaching a leaf.
        DictValue::Map(_) => Vec::new(),
    }
}

/// Hashed node of a mapping, children already in canonical order.
#[derive(Debug)]
enum Shape {
    Leaf { digest: Digest, payload: Vec<u8> },
    Branch { digest: Digest, children: Vec<usize> },
}

impl Shape {
    fn digest(&self) -> &Digest {
        match self {
            Shape::Leaf { digest, .. } | Shape::Branch { digest, .. } => digest,
        }
    }
}

/// Hashes every slot bottom-up into a shape arena, returning the arena and
/// the shape standing for the top-level mapping.
fn hash_shapes(mut entries: Entries, algorithm: Algorithm) -> (Vec<Shape>, Option<usize>) {
    let mut shapes: Vec<Shape> = Vec::new();
    let mut resolved: Vec<Option<usize>> = vec![None; entries.slots.len()];
    let mut stack = vec![(TOP, false)];
    while let Some((slot, expanded)) = stack.pop() {
        let entry = std::mem::replace(&mut entries.slots[slot], Entry::Map(Vec::new()));
        match entry {
            Entry::Value(payload) => {
                resolved[slot] = Some(shapes.len());
                shapes.push(Shape::Leaf {
                    digest: algorithm.digest(&payload),
                    payload,
                });
            }
            Entry::Map(children) if !expanded => {
                stack.push((slot, true));
                stack.extend(children.iter().map(|&(_, child)| (child, false)));
                entries.slots[slot] = Entry::Map(children);
            }
            Entry::Map(children) => {
                let mut present: Vec<usize> = children
                    .iter()
                    .filter_map(|&(_, child)| resolved[child])
                    .collect();
                resolved[slot] = match present.len() {
                    0 => None,
                    1 => present.pop(),
                    _ => {
                        present.sort_by(|&a, &b| {
                            shapes[a].digest().as_bytes().cmp(shapes[b].digest().as_bytes())
                        });
                        let mut hasher = algorithm.hasher();
                        for &child in &present {
                            hasher.update(shapes[child].digest().as_bytes());
                        }
                        shapes.push(Shape::Branch {
                            digest: hasher.finalize(),
                            children: present,
                        });
                        Some(shapes.len() - 1)
                    }
                };
            }
        }
    }
    (shapes, resolved[TOP])
}

/// Arena produced from a mapping: nodes, leaf order and root.
pub(crate) struct DictLayout {
    pub(crate) nodes: Vec<MerkleNode>,
    pub(crate) leaves: Vec<NodeIndex>,
    pub(crate) root: Option<NodeIndex>,
}

/// Lays out the canonical tree: leaves first in left-to-right order, then
/// internal nodes in post-order.
pub(crate) fn layout(entries: Entries, algorithm: Algorithm, retain_payloads: bool) -> DictLayout {
    let (mut shapes, top) = hash_shapes(entries, algorithm);
    let Some(top) = top else {
        return DictLayout {
            nodes: Vec::new(),
            leaves: Vec::new(),
            root: None,
        };
    };

    let mut placed: Vec<NodeIndex> = vec![0; shapes.len()];
    let mut nodes = Vec::new();
    let mut stack = vec![top];
    while let Some(shape) = stack.pop() {
        match &mut shapes[shape] {
            Shape::Leaf { digest, payload } => {
                placed[shape] = nodes.len();
                let payload = std::mem::take(payload);
                nodes.push(MerkleNode::hashed_leaf(
                    algorithm,
                    digest.clone(),
                    retain_payloads.then_some(payload),
                ));
            }
            Shape::Branch { children, .. } => stack.extend(children.iter().rev()),
        }
    }
    let leaves: Vec<NodeIndex> = (0..nodes.len()).collect();

    let mut stack = vec![(top, false)];
    while let Some((shape, expanded)) = stack.pop() {
        let Shape::Branch { digest, children } = &shapes[shape] else {
            continue;
        };
        if !expanded {
            stack.push((shape, true));
            stack.extend(children.iter().rev().map(|&child| (child, false)));
            continue;
        }
        let index = nodes.len();
        let child_indices: Vec<NodeIndex> = children.iter().map(|&child| placed[child]).collect();
        for &child in &child_indices {
            nodes[child].set_parent(index);
        }
        nodes.push(MerkleNode::internal(algorithm, digest.clone(), child_indices));
        placed[shape] = index;
    }
    DictLayout {
        nodes,
        leaves,
        root: Some(placed[top]),
    }
}

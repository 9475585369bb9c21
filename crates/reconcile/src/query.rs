//! Query composition
//!
//! Categories declare which fields they need as [`SelectionFragment`]s. The
//! [`QueryComposer`] merges any number of fragments into one request:
//! fragments sharing a root are merged field by field (a trie keyed by field
//! name), so overlapping selections produce each field exactly once.
//!
//! Output is sorted at every level, which makes it independent of insertion
//! order and textually stable across builds.

use std::collections::BTreeMap;

/// One requested field, optionally with a nested selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    pub name: String,
    pub children: Vec<FieldSelection>,
}

impl FieldSelection {
    /// A scalar field with no nested selection.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// A field with a nested selection.
    pub fn nested(name: impl Into<String>, children: Vec<FieldSelection>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// Shorthand for [`FieldSelection::leaf`].
pub fn field(name: &str) -> FieldSelection {
    FieldSelection::leaf(name)
}

/// Shorthand for a nested selection whose children are all scalars.
pub fn fields(name: &str, leaves: &[&str]) -> FieldSelection {
    FieldSelection::nested(name, leaves.iter().map(|leaf| field(leaf)).collect())
}

/// What one category needs from the remote API: a root field plus the
/// selection beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFragment {
    pub root: String,
    pub fields: Vec<FieldSelection>,
}

impl SelectionFragment {
    pub fn new(root: impl Into<String>, fields: Vec<FieldSelection>) -> Self {
        Self {
            root: root.into(),
            fields,
        }
    }
}

/// A field trie: field name → nested selection.
///
/// An empty tree is a scalar field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTree {
    children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this node has no nested selection.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Nested field, if selected.
    pub fn get(&self, name: &str) -> Option<&FieldTree> {
        self.children.get(name)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert a selection, reusing existing nodes.
    pub fn insert(&mut self, selection: &FieldSelection) {
        let node = self.children.entry(selection.name.clone()).or_default();
        for child in &selection.children {
            node.insert(child);
        }
    }

    /// Insert one path of field names (`["cpu", "cpus", "percentTotal"]`).
    pub fn insert_path(&mut self, path: &[&str]) {
        let mut node = self;
        for name in path {
            node = node.children.entry((*name).to_string()).or_default();
        }
    }

    /// Merge another tree into this one.
    pub fn merge(&mut self, other: &FieldTree) {
        for (name, subtree) in &other.children {
            self.children.entry(name.clone()).or_default().merge(subtree);
        }
    }

    /// Serialize the children of this node, one field per line.
    pub fn write(&self, out: &mut String, depth: usize) {
        for (name, child) in &self.children {
            push_indent(out, depth);
            out.push_str(name);
            if child.is_leaf() {
                out.push('\n');
            } else {
                out.push_str(" {\n");
                child.write(out, depth + 1);
                push_indent(out, depth);
                out.push_str("}\n");
            }
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Accumulates selection fragments and renders one composite query.
#[derive(Debug, Clone, Default)]
pub struct QueryComposer {
    roots: FieldTree,
}

impl QueryComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of fragments into the accumulator.
    pub fn add_fragments(&mut self, fragments: &[SelectionFragment]) {
        for fragment in fragments {
            self.add_fragment(fragment);
        }
    }

    /// Merge a single fragment into the accumulator.
    pub fn add_fragment(&mut self, fragment: &SelectionFragment) {
        self.roots.insert(&FieldSelection::nested(
            fragment.root.clone(),
            fragment.fields.clone(),
        ));
    }

    /// Whether nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Root field names, sorted.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.children.keys().map(String::as_str)
    }

    /// The merged tree for one root.
    pub fn root(&self, name: &str) -> Option<&FieldTree> {
        self.roots.get(name)
    }

    /// Render the composite query, or `None` when nothing was added.
    ///
    /// `None` means "nothing to fetch this cycle", not an error.
    pub fn build(&self) -> Option<String> {
        if self.roots.is_empty() {
            return None;
        }
        let mut out = String::from("query {\n");
        self.roots.write(&mut out, 1);
        out.push('}');
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_total() -> SelectionFragment {
        SelectionFragment::new("metrics", vec![fields("cpu", &["percentTotal"])])
    }

    fn cpu_cores() -> SelectionFragment {
        SelectionFragment::new(
            "metrics",
            vec![FieldSelection::nested(
                "cpu",
                vec![fields("cpus", &["percentTotal"])],
            )],
        )
    }

    #[test]
    fn test_empty_composer_builds_nothing() {
        let composer = QueryComposer::new();
        assert!(composer.is_empty());
        assert_eq!(composer.build(), None);
    }

    #[test]
    fn test_fragments_with_same_root_merge() {
        let mut composer = QueryComposer::new();
        composer.add_fragments(&[cpu_total(), cpu_cores()]);

        let expected = "query {\n\
                        \x20 metrics {\n\
                        \x20   cpu {\n\
                        \x20     cpus {\n\
                        \x20       percentTotal\n\
                        \x20     }\n\
                        \x20     percentTotal\n\
                        \x20   }\n\
                        \x20 }\n\
                        }";
        assert_eq!(composer.build().as_deref(), Some(expected));
        assert_eq!(composer.roots().collect::<Vec<_>>(), vec!["metrics"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut composer = QueryComposer::new();
        composer.add_fragments(&[cpu_total(), cpu_cores()]);
        let first = composer.build();
        let second = composer.build();
        assert_eq!(first, second);

        // Adding the same fragments again changes nothing
        composer.add_fragments(&[cpu_cores(), cpu_total()]);
        assert_eq!(composer.build(), first);
    }

    #[test]
    fn test_output_is_independent_of_insertion_order() {
        let mut forward = QueryComposer::new();
        forward.add_fragments(&[
            SelectionFragment::new("server", vec![field("b"), field("a")]),
            SelectionFragment::new("info", vec![field("time")]),
        ]);

        let mut backward = QueryComposer::new();
        backward.add_fragments(&[
            SelectionFragment::new("info", vec![field("time")]),
            SelectionFragment::new("server", vec![field("a")]),
            SelectionFragment::new("server", vec![field("b")]),
        ]);

        let text = forward.build().unwrap();
        assert_eq!(Some(text.clone()), backward.build());
        let a = text.find("    a\n").unwrap();
        let b = text.find("    b\n").unwrap();
        assert!(a < b);
        assert!(text.find("info").unwrap() < text.find("server").unwrap());
    }

    #[test]
    fn test_root_without_fields_is_bare() {
        let mut composer = QueryComposer::new();
        composer.add_fragment(&SelectionFragment::new("online", vec![]));
        assert_eq!(composer.build().as_deref(), Some("query {\n  online\n}"));
    }

    #[test]
    fn test_field_tree_insert_path_and_merge() {
        let mut left = FieldTree::new();
        left.insert_path(&["cpu", "percentTotal"]);
        let mut right = FieldTree::new();
        right.insert_path(&["cpu", "cpus", "percentTotal"]);
        right.insert_path(&["memory", "total"]);

        left.merge(&right);
        assert_eq!(left.len(), 2);
        let cpu = left.get("cpu").unwrap();
        assert!(cpu.get("percentTotal").unwrap().is_leaf());
        assert!(!cpu.get("cpus").unwrap().is_leaf());
    }
}

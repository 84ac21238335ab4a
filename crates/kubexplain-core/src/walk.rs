//! Deterministic pre-order traversal of a tree
//!
//! Paths use dots for mapping descent and `[i]` for sequence descent:
//! `spec.containers[0].image`. A key that would make the path ambiguous
//! (it contains `.`, `[`, `]` or `"`, or is empty) is written in quoted
//! bracket form: `metadata.labels["app.kubernetes.io/name"]`.

use std::fmt;

use crate::resource::Resource;
use crate::tree::TreeNode;

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Address of a node inside a tree; empty for the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// True when `ancestor` is a proper prefix of this path
    pub fn is_under(&self, ancestor: &FieldPath) -> bool {
        self.0.len() > ancestor.0.len() && self.0.starts_with(&ancestor.0)
    }

    /// The node this path addresses under `root`
    pub fn resolve<'a>(&self, root: &'a TreeNode) -> Option<&'a TreeNode> {
        self.0.iter().try_fold(root, |node, segment| match segment {
            PathSegment::Key(key) => node.get(key),
            PathSegment::Index(index) => node.as_sequence()?.get(*index),
        })
    }

    /// Last mapping key on the path, if any
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) if needs_quoting(key) => {
                    write!(f, "[\"{}\"]", key.replace('\\', "\\\\").replace('"', "\\\""))?
                }
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
            }
        }
        Ok(())
    }
}

/// Whether a key must be written as `["key"]`
pub fn needs_quoting(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"'])
}

/// A visited node and its path
#[derive(Debug, Clone)]
pub struct NodeEntry<'a> {
    pub path: FieldPath,
    pub value: &'a TreeNode,
}

/// A visited node of a resource
#[derive(Debug, Clone)]
pub struct PathEntry<'a> {
    pub path: FieldPath,
    pub value: &'a TreeNode,
    pub resource: &'a Resource,
}

/// Lazy pre-order traversal, see [`walk`]
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(FieldPath, &'a TreeNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;

        // Children go on the stack reversed so they pop in source order
        match node {
            TreeNode::Mapping(entries) => {
                for (key, child) in entries.iter().rev() {
                    self.stack.push((path.key(key.as_str()), child));
                }
            }
            TreeNode::Sequence(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    self.stack.push((path.index(index), child));
                }
            }
            TreeNode::Scalar(_) => {}
        }

        Some(NodeEntry { path, value: node })
    }
}

/// Walk every node of `root`, the root first (at the empty path)
///
/// Mapping entries are visited in insertion order, sequence items in index
/// order, and a container is yielded before its children. Each call starts a
/// fresh traversal.
pub fn walk(root: &TreeNode) -> Walk<'_> {
    Walk {
        stack: vec![(FieldPath::root(), root)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(yaml: &str) -> Vec<String> {
        let tree = TreeNode::parse(yaml).unwrap();
        walk(&tree).map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn test_preorder_paths() {
        let got = paths(
            r#"
metadata:
  name: web
spec:
  containers:
  - name: c
    ports:
    - containerPort: 80
  - name: d
"#,
        );
        assert_eq!(
            got,
            vec![
                "",
                "metadata",
                "metadata.name",
                "spec",
                "spec.containers",
                "spec.containers[0]",
                "spec.containers[0].name",
                "spec.containers[0].ports",
                "spec.containers[0].ports[0]",
                "spec.containers[0].ports[0].containerPort",
                "spec.containers[1]",
                "spec.containers[1].name",
            ]
        );
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(paths("42"), vec![""]);
    }

    #[test]
    fn test_nested_sequences() {
        assert_eq!(
            paths("matrix:\n- [1, 2]\n"),
            vec!["", "matrix", "matrix[0]", "matrix[0][0]", "matrix[0][1]"]
        );
    }

    #[test]
    fn test_dotted_keys_are_quoted() {
        let got = paths("labels:\n  app.kubernetes.io/name: web\n  tier: db\n");
        assert_eq!(
            got,
            vec!["", "labels", "labels[\"app.kubernetes.io/name\"]", "labels.tier"]
        );
    }

    #[test]
    fn test_two_walks_are_identical() {
        let tree = TreeNode::parse("b: {y: 1, x: [true, null]}\na: 2\n").unwrap();
        let first: Vec<(String, TreeNode)> = walk(&tree)
            .map(|e| (e.path.to_string(), e.value.clone()))
            .collect();
        let second: Vec<(String, TreeNode)> = walk(&tree)
            .map(|e| (e.path.to_string(), e.value.clone()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_walk_is_lazy() {
        let tree = TreeNode::parse("a: 1\nb: 2\nc: 3\n").unwrap();
        let mut iter = walk(&tree);
        iter.next();
        let second = iter.next().unwrap();
        assert_eq!(second.path.to_string(), "a");
        assert_eq!(second.value.as_i64(), Some(1));
    }

    #[test]
    fn test_resolve_follows_keys_and_indices() {
        let tree = TreeNode::parse(
            "metadata:\n  labels:\n    app.kubernetes.io/name: web\nitems:\n- a\n- b\n",
        )
        .unwrap();
        let label = FieldPath::root()
            .key("metadata")
            .key("labels")
            .key("app.kubernetes.io/name");
        assert_eq!(label.resolve(&tree).and_then(TreeNode::as_str), Some("web"));

        let second = FieldPath::root().key("items").index(1);
        assert_eq!(second.resolve(&tree).and_then(TreeNode::as_str), Some("b"));
        assert!(FieldPath::root().key("items").index(2).resolve(&tree).is_none());
        assert!(FieldPath::root().key("items").key("a").resolve(&tree).is_none());
        assert_eq!(FieldPath::root().resolve(&tree), Some(&tree));
    }

    #[test]
    fn test_is_under() {
        let spec = FieldPath::root().key("spec");
        let selector = spec.key("selector");
        assert!(selector.is_under(&spec));
        assert!(!spec.is_under(&spec));
        assert!(!FieldPath::root().key("specs").is_under(&spec));
    }

    #[test]
    fn test_last_key() {
        let path = FieldPath::root().key("spec").key("containers").index(0);
        assert_eq!(path.last_key(), Some("containers"));
        assert_eq!(path.to_string(), "spec.containers[0]");
        assert!(FieldPath::root().last_key().is_none());
    }
}

//! In-memory tree for parsed manifest documents
//!
//! A [`TreeNode`] is one of three shapes: a scalar, a sequence or a mapping.
//! Scalars keep the subtype the parser saw (integer, float, boolean, string,
//! null) because explanation and validation output depend on it, e.g. a
//! `containerPort: "80"` is not the same finding as `containerPort: 80`.

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value as YamlValue;
use std::fmt;

use crate::error::{CoreError, Result};

/// A leaf value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Name of the scalar subtype, as shown in messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Int(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{:?}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// A node of a parsed document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    Scalar(Scalar),
    Sequence(Vec<TreeNode>),
    /// Keys are unique and kept in source order
    Mapping(IndexMap<String, TreeNode>),
}

impl Default for TreeNode {
    fn default() -> Self {
        TreeNode::Scalar(Scalar::Null)
    }
}

impl TreeNode {
    /// The null node
    pub fn null() -> Self {
        Self::default()
    }

    /// Build a tree from a parsed YAML value
    ///
    /// Explicitly tagged nodes are rejected, as are mappings used as keys.
    pub fn from_yaml(value: YamlValue) -> Result<Self> {
        Ok(match value {
            YamlValue::Null => TreeNode::Scalar(Scalar::Null),
            YamlValue::Bool(b) => TreeNode::Scalar(Scalar::Bool(b)),
            YamlValue::Number(n) => TreeNode::Scalar(number_to_scalar(&n)),
            YamlValue::String(s) => TreeNode::Scalar(Scalar::String(s)),
            YamlValue::Sequence(items) => TreeNode::Sequence(
                items
                    .into_iter()
                    .map(TreeNode::from_yaml)
                    .collect::<Result<Vec<_>>>()?,
            ),
            YamlValue::Mapping(mapping) => {
                let mut entries = IndexMap::with_capacity(mapping.len());
                for (key, value) in mapping {
                    entries.insert(key_to_string(key)?, TreeNode::from_yaml(value)?);
                }
                TreeNode::Mapping(entries)
            }
            YamlValue::Tagged(tagged) => {
                return Err(CoreError::DisallowedTag {
                    tag: tagged.tag.to_string(),
                });
            }
        })
    }

    /// Parse a single YAML document
    pub fn parse(yaml: &str) -> Result<Self> {
        let value: YamlValue = serde_yaml::from_str(yaml)?;
        Self::from_yaml(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TreeNode::Scalar(Scalar::Null))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            TreeNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TreeNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TreeNode::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, TreeNode>> {
        match self {
            TreeNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Child of a mapping by key
    pub fn get(&self, key: &str) -> Option<&TreeNode> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Descend through mappings by dotted path (e.g. `spec.selector.matchLabels`)
    pub fn get_path(&self, path: &str) -> Option<&TreeNode> {
        path.split('.')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| node.get(part))
    }

    /// True for a null node or a container with no children
    pub fn is_empty(&self) -> bool {
        match self {
            TreeNode::Scalar(Scalar::Null) => true,
            TreeNode::Scalar(_) => false,
            TreeNode::Sequence(items) => items.is_empty(),
            TreeNode::Mapping(entries) => entries.is_empty(),
        }
    }

    /// Number of direct children (0 for scalars)
    pub fn len(&self) -> usize {
        match self {
            TreeNode::Scalar(_) => 0,
            TreeNode::Sequence(items) => items.len(),
            TreeNode::Mapping(entries) => entries.len(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TreeNode::Scalar(s) => s.type_name(),
            TreeNode::Sequence(_) => "sequence",
            TreeNode::Mapping(_) => "mapping",
        }
    }
}

fn number_to_scalar(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Int(i)
    } else {
        // u64 above i64::MAX, or a real float
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn key_to_string(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => Err(CoreError::DisallowedTag {
            tag: tagged.tag.to_string(),
        }),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(CoreError::NonScalarKey),
    }
}

//! Resource extraction
//!
//! A [`Document`] becomes a [`Resource`] when its root carries the two
//! discriminator fields, `kind` and `apiVersion`. Documents without them are
//! returned as [`Unrecognized`] markers so callers can report them.

use serde::Serialize;
use std::fmt;

use crate::document::{Document, SplitResult};
use crate::tree::{Scalar, TreeNode};
use crate::walk::{PathEntry, walk};

/// Namespace assumed by Kubernetes when none is given
pub const DEFAULT_NAMESPACE: &str = "default";

/// A document recognized as a Kubernetes object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub kind: String,
    /// `group/version`, or just `version` for the core group
    pub api_version: String,
    pub name: Option<String>,
    /// Stored as written; see [`Resource::effective_namespace`]
    pub namespace: Option<String>,
    pub content: TreeNode,
    pub source_index: usize,
}

impl Resource {
    /// API group (`""` for the core group)
    pub fn group(&self) -> &str {
        match self.api_version.rsplit_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    /// API version without the group
    pub fn version(&self) -> &str {
        match self.api_version.rsplit_once('/') {
            Some((_, version)) => version,
            None => &self.api_version,
        }
    }

    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// `Kind/name` or `namespace/Kind/name`
    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unnamed");
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", ns, self.kind, name),
            None => format!("{}/{}", self.kind, name),
        }
    }

    /// Every descendant of the resource root in pre-order
    ///
    /// The root itself (empty path) is not yielded.
    pub fn paths(&self) -> impl Iterator<Item = PathEntry<'_>> + '_ {
        walk(&self.content).skip(1).map(move |node| PathEntry {
            path: node.path,
            value: node.value,
            resource: self,
        })
    }
}

/// Why a document could not be identified as a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum UnrecognizedReason {
    Empty,
    NotAMapping { found: String },
    MissingKind,
    MissingApiVersion,
    MissingKindAndApiVersion,
    InvalidField { field: String, found: String },
}

impl fmt::Display for UnrecognizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("document is empty"),
            Self::NotAMapping { found } => {
                write!(f, "document root is a {}, expected a mapping", found)
            }
            Self::MissingKind => f.write_str("missing kind field"),
            Self::MissingApiVersion => f.write_str("missing apiVersion field"),
            Self::MissingKindAndApiVersion => f.write_str("missing kind and apiVersion fields"),
            Self::InvalidField { field, found } => {
                write!(f, "{} field must be a non-empty string, found {}", field, found)
            }
        }
    }
}

/// A document that is not a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unrecognized {
    pub index: usize,
    pub reason: UnrecognizedReason,
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document {}: {}", self.index, self.reason)
    }
}

/// Outcome of extracting one document
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Resource(Resource),
    Unrecognized(Unrecognized),
}

/// Resources and unrecognized markers for a whole split, in source order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub resources: Vec<Resource>,
    pub unrecognized: Vec<Unrecognized>,
}

/// Extract a resource from one document
///
/// Only `kind`, `apiVersion`, `metadata.name` and `metadata.namespace` are
/// read. Missing name or namespace is not an error.
pub fn extract(document: &Document) -> Extracted {
    let index = document.source_index;
    let unrecognized = |reason| Extracted::Unrecognized(Unrecognized { index, reason });

    let root = match &document.root {
        TreeNode::Mapping(_) => &document.root,
        node if node.is_null() => return unrecognized(UnrecognizedReason::Empty),
        other => {
            return unrecognized(UnrecognizedReason::NotAMapping {
                found: other.type_name().to_string(),
            });
        }
    };

    let kind = match discriminator(root, "kind") {
        Ok(kind) => kind,
        Err(reason) => return unrecognized(reason),
    };
    let api_version = match discriminator(root, "apiVersion") {
        Ok(api_version) => api_version,
        Err(reason) => return unrecognized(reason),
    };

    let (kind, api_version) = match (kind, api_version) {
        (Some(kind), Some(api_version)) => (kind, api_version),
        (None, None) => return unrecognized(UnrecognizedReason::MissingKindAndApiVersion),
        (None, Some(_)) => return unrecognized(UnrecognizedReason::MissingKind),
        (Some(_), None) => return unrecognized(UnrecognizedReason::MissingApiVersion),
    };

    let metadata_field = |field: &str| {
        root.get("metadata")
            .and_then(|m| m.get(field))
            .and_then(TreeNode::as_str)
            .map(String::from)
    };

    Extracted::Resource(Resource {
        kind,
        api_version,
        name: metadata_field("name"),
        namespace: metadata_field("namespace"),
        content: document.root.clone(),
        source_index: index,
    })
}

/// Extract every non-skippable document of a split
pub fn extract_all(split: &SplitResult) -> Extraction {
    let mut extraction = Extraction::default();

    for document in split.non_empty_documents() {
        match extract(document) {
            Extracted::Resource(resource) => extraction.resources.push(resource),
            Extracted::Unrecognized(marker) => {
                tracing::debug!(index = marker.index, reason = %marker.reason, "unrecognized document");
                extraction.unrecognized.push(marker);
            }
        }
    }

    tracing::debug!(
        resources = extraction.resources.len(),
        unrecognized = extraction.unrecognized.len(),
        "extracted resources"
    );
    extraction
}

/// Read a discriminator: absent/null/empty is `None`, a non-string is an error
fn discriminator(
    root: &TreeNode,
    field: &str,
) -> std::result::Result<Option<String>, UnrecognizedReason> {
    match root.get(field) {
        None => Ok(None),
        Some(node) if node.is_null() => Ok(None),
        Some(TreeNode::Scalar(Scalar::String(s))) if s.trim().is_empty() => Ok(None),
        Some(TreeNode::Scalar(Scalar::String(s))) => Ok(Some(s.clone())),
        Some(other) => Err(UnrecognizedReason::InvalidField {
            field: field.to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

//! kubexplain core - turning manifest text into addressable resources
//!
//! This crate provides the foundational pieces shared by the engines:
//! - `TreeNode`: parsed document tree with scalar subtypes preserved
//! - `split`: multi-document splitting with per-document parse errors
//! - `extract`: resource recognition by `kind` / `apiVersion`
//! - `walk`: deterministic pre-order traversal with canonical field paths

pub mod document;
pub mod error;
pub mod resource;
pub mod tree;
pub mod walk;

pub use document::{Document, SplitResult, split};
pub use error::{CoreError, ParseError, Result};
pub use resource::{
    Extracted, Extraction, Resource, Unrecognized, UnrecognizedReason, extract, extract_all,
};
pub use tree::{Scalar, TreeNode};
pub use walk::{FieldPath, NodeEntry, PathEntry, PathSegment, Walk, walk};

//! Multi-document splitting
//!
//! Input text is cut on lines consisting solely of `---`. Every segment keeps
//! its position, so index `i` always refers to the same part of the input in
//! documents, parse errors and downstream reports, even when some segments
//! are blank or broken.

use serde::Serialize;
use yaml_rust2::parser::{Event, EventReceiver, Parser};

use crate::error::{CoreError, ParseError, Result};
use crate::tree::TreeNode;

/// Document separator line
pub const SEPARATOR: &str = "---";

/// Namespace `!!` expands to
const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Tags from the YAML core and type repositories that carry no behavior
const SAFE_GLOBAL_TAGS: &[&str] = &[
    "str", "int", "float", "bool", "null", "map", "seq", "binary", "timestamp", "set", "omap",
    "pairs", "merge",
];

/// One parsed segment of the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub root: TreeNode,
    /// Position of the segment in the input (0-based)
    pub source_index: usize,
    pub raw_text: String,
    skippable: bool,
}

impl Document {
    /// True when the segment only holds blank lines or comments
    pub fn skippable(&self) -> bool {
        self.skippable
    }
}

/// Output of [`split`]: parsed documents plus per-document failures
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitResult {
    pub documents: Vec<Document>,
    pub errors: Vec<ParseError>,
}

impl SplitResult {
    /// True when every segment parsed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Documents that carry content
    pub fn non_empty_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| !d.skippable)
    }

    /// Total number of segments seen, parsed or not
    pub fn segment_count(&self) -> usize {
        self.documents.len() + self.errors.len()
    }
}

/// Split raw text into documents
///
/// A broken segment yields a [`ParseError`] for its index and does not stop
/// the remaining segments from being parsed.
pub fn split(raw: &str) -> SplitResult {
    let mut result = SplitResult::default();

    for (index, segment) in segments(raw).into_iter().enumerate() {
        if is_blank_or_comment(&segment) {
            result.documents.push(Document {
                root: TreeNode::null(),
                source_index: index,
                raw_text: segment,
                skippable: true,
            });
            continue;
        }

        match parse_segment(&segment) {
            Ok(root) => result.documents.push(Document {
                root,
                source_index: index,
                raw_text: segment,
                skippable: false,
            }),
            Err(e) => {
                tracing::warn!(index, error = %e, "document failed to parse");
                result.errors.push(ParseError::new(index, e.to_string()));
            }
        }
    }

    tracing::debug!(
        documents = result.documents.len(),
        errors = result.errors.len(),
        "split manifest"
    );
    result
}

fn parse_segment(segment: &str) -> Result<TreeNode> {
    if let Some(tag) = find_unsafe_tag(segment) {
        return Err(CoreError::DisallowedTag { tag });
    }
    TreeNode::parse(segment)
}

/// Find an explicit tag outside the safe set (e.g. `!!python/object/apply:...`)
///
/// Tags are read from the parser's event stream, so `!!` inside scalar text
/// is never mistaken for one. `serde_yaml` drops global tags it resolves,
/// both the `!!name` shorthand and the verbatim `!<tag:yaml.org,2002:name>`
/// form, so they have to be caught here. Syntax errors are left to the tree
/// conversion.
fn find_unsafe_tag(segment: &str) -> Option<String> {
    let mut scan = TagScan::default();
    let mut parser = Parser::new_from_str(segment);
    if let Err(err) = parser.load(&mut scan, false) {
        tracing::trace!(error = %err, "tag scan stopped early");
    }
    scan.unsafe_tag
}

#[derive(Default)]
struct TagScan {
    unsafe_tag: Option<String>,
}

impl EventReceiver for TagScan {
    fn on_event(&mut self, event: Event) {
        if self.unsafe_tag.is_some() {
            return;
        }
        let tag = match event {
            Event::Scalar(_, _, _, Some(tag))
            | Event::SequenceStart(_, Some(tag))
            | Event::MappingStart(_, Some(tag)) => tag,
            _ => return,
        };
        let full = format!("{}{}", tag.handle, tag.suffix);
        match core_tag_name(&full) {
            Some(name) if SAFE_GLOBAL_TAGS.contains(&name) => {}
            Some(name) => self.unsafe_tag = Some(format!("!!{}", name)),
            None => self.unsafe_tag = Some(full),
        }
    }
}

/// Name of a tag in the YAML core namespace, however it was written
fn core_tag_name(full: &str) -> Option<&str> {
    let uri = full.strip_prefix('!').unwrap_or(full);
    uri.strip_prefix(CORE_TAG_PREFIX).or_else(|| full.strip_prefix("!!"))
}

/// Cut the input on separator lines
fn segments(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for line in raw.split('\n') {
        if is_separator(line) {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    segments.push(current);

    // `split('\n')` sees one phantom empty line after a trailing newline
    if let Some(last) = segments.last_mut() {
        if last.ends_with("\n\n") || last.as_str() == "\n" {
            last.pop();
        }
    }

    segments
}

fn is_separator(line: &str) -> bool {
    line.trim_end_matches('\r').trim_end() == SEPARATOR
}

fn is_blank_or_comment(segment: &str) -> bool {
    segment
        .lines()
        .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'))
}

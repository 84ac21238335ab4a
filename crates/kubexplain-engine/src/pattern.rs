//! Field-path patterns for rule tables
//!
//! Grammar:
//! - `spec.replicas` - mapping keys separated by dots
//! - `spec.containers[0]` - a concrete sequence index
//! - `spec.containers[*]` - any sequence index
//! - `metadata.labels["app.kubernetes.io/name"]` - a key containing dots
//! - `..containers[*].image` - a leading `..` lets the pattern match the end
//!   of any path (Pod `spec.containers`, Deployment
//!   `spec.template.spec.containers`, ...)

use kubexplain_core::{FieldPath, PathSegment};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// One step of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    Key(String),
    Index(usize),
    AnyIndex,
}

impl PatternSegment {
    fn matches(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (PatternSegment::Key(a), PathSegment::Key(b)) => a == b,
            (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
            (PatternSegment::AnyIndex, PathSegment::Index(_)) => true,
            _ => false,
        }
    }
}

/// How specific a pattern is; greater wins
///
/// Anchored beats floating, then more segments, then fewer `[*]` segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    anchored: bool,
    segments: usize,
    wildcards: Reverse<usize>,
}

/// A parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePattern {
    source: String,
    segments: Vec<PatternSegment>,
    floating: bool,
}

impl RulePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let (floating, body) = match pattern.strip_prefix("..") {
            Some(rest) => (true, rest),
            None => (false, pattern),
        };

        let segments =
            parse_segments(body).map_err(|reason| EngineError::invalid_pattern(pattern, reason))?;

        Ok(Self {
            source: pattern.to_string(),
            segments,
            floating,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// True when the pattern only needs to match the end of a path
    pub fn is_floating(&self) -> bool {
        self.floating
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::AnyIndex)
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            anchored: !self.floating,
            segments: self.segments.len(),
            wildcards: Reverse(
                self.segments
                    .iter()
                    .filter(|s| **s == PatternSegment::AnyIndex)
                    .count(),
            ),
        }
    }

    pub fn matches(&self, path: &FieldPath) -> bool {
        let path = path.segments();
        if self.floating {
            if path.len() < self.segments.len() {
                return false;
            }
            let tail = &path[path.len() - self.segments.len()..];
            self.segments.iter().zip(tail).all(|(p, s)| p.matches(s))
        } else {
            path.len() == self.segments.len()
                && self.segments.iter().zip(path).all(|(p, s)| p.matches(s))
        }
    }

    /// The single concrete path an anchored, wildcard-free pattern names
    pub fn to_field_path(&self) -> Option<FieldPath> {
        if self.floating {
            return None;
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                PatternSegment::Key(key) => Some(PathSegment::Key(key.clone())),
                PatternSegment::Index(index) => Some(PathSegment::Index(*index)),
                PatternSegment::AnyIndex => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(FieldPath::from_segments)
    }
}

impl FromStr for RulePattern {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(body: &str) -> std::result::Result<Vec<PatternSegment>, String> {
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    if chars.is_empty() {
        return Err("pattern is empty".to_string());
    }

    while pos < chars.len() {
        if chars[pos] == '[' {
            let (segment, next) = parse_bracket(&chars, pos)?;
            segments.push(segment);
            pos = next;
        } else {
            let start = pos;
            while pos < chars.len() && chars[pos] != '.' && chars[pos] != '[' {
                if chars[pos] == ']' || chars[pos] == '"' {
                    return Err(format!("unexpected '{}' at position {}", chars[pos], pos));
                }
                pos += 1;
            }
            if pos == start {
                return Err(format!("empty key at position {}", start));
            }
            segments.push(PatternSegment::Key(chars[start..pos].iter().collect()));
        }

        if pos < chars.len() && chars[pos] == '.' {
            pos += 1;
            if pos == chars.len() {
                return Err("pattern ends with '.'".to_string());
            }
            if chars[pos] == '[' || chars[pos] == '.' {
                return Err(format!("empty key at position {}", pos));
            }
        }
    }

    Ok(segments)
}

/// Parse `[n]`, `[*]` or `["key"]` starting at `start`
fn parse_bracket(
    chars: &[char],
    start: usize,
) -> std::result::Result<(PatternSegment, usize), String> {
    let mut pos = start + 1;

    if chars.get(pos) == Some(&'"') {
        pos += 1;
        let mut key = String::new();
        loop {
            match chars.get(pos) {
                None => return Err("unterminated quoted key".to_string()),
                Some('\\') => {
                    let escaped = chars
                        .get(pos + 1)
                        .ok_or_else(|| "unterminated escape".to_string())?;
                    key.push(*escaped);
                    pos += 2;
                }
                Some('"') => {
                    pos += 1;
                    break;
                }
                Some(c) => {
                    key.push(*c);
                    pos += 1;
                }
            }
        }
        if chars.get(pos) != Some(&']') {
            return Err(format!("expected ']' at position {}", pos));
        }
        return Ok((PatternSegment::Key(key), pos + 1));
    }

    let close = chars[pos..]
        .iter()
        .position(|c| *c == ']')
        .map(|offset| pos + offset)
        .ok_or_else(|| format!("unclosed '[' at position {}", start))?;
    let inner: String = chars[pos..close].iter().collect();

    let segment = if inner == "*" {
        PatternSegment::AnyIndex
    } else {
        let index = inner
            .parse::<usize>()
            .map_err(|_| format!("'[{}]' is not an index or '[*]'", inner))?;
        PatternSegment::Index(index)
    };
    Ok((segment, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> FieldPath {
        FieldPath::from_segments(
            segments
                .iter()
                .map(|s| match s.parse::<usize>() {
                    Ok(i) => PathSegment::Index(i),
                    Err(_) => PathSegment::Key(s.to_string()),
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_segments() {
        let p = RulePattern::parse("spec.containers[*].ports[0].containerPort").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PatternSegment::Key("spec".into()),
                PatternSegment::Key("containers".into()),
                PatternSegment::AnyIndex,
                PatternSegment::Key("ports".into()),
                PatternSegment::Index(0),
                PatternSegment::Key("containerPort".into()),
            ]
        );
        assert!(!p.is_floating());
        assert!(p.has_wildcard());
    }

    #[test]
    fn test_parse_quoted_key() {
        let p = RulePattern::parse(r#"metadata.labels["app.kubernetes.io/name"]"#).unwrap();
        assert_eq!(
            p.segments()[2],
            PatternSegment::Key("app.kubernetes.io/name".into())
        );
        assert!(p.matches(&path(&["metadata", "labels", "app.kubernetes.io/name"])));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "..", "spec.", "spec..x", "a[", "a[x]", "a.[0]", "a]b", "[\"open"] {
            assert!(RulePattern::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_anchored_match() {
        let p = RulePattern::parse("spec.containers[*].image").unwrap();
        assert!(p.matches(&path(&["spec", "containers", "0", "image"])));
        assert!(p.matches(&path(&["spec", "containers", "7", "image"])));
        assert!(!p.matches(&path(&["spec", "containers", "0"])));
        assert!(!p.matches(&path(&[
            "spec", "template", "spec", "containers", "0", "image"
        ])));
    }

    #[test]
    fn test_wildcard_only_matches_indices() {
        let p = RulePattern::parse("data[*]").unwrap();
        assert!(!p.matches(&path(&["data", "key"])));
    }

    #[test]
    fn test_floating_match() {
        let p = RulePattern::parse("..containers[*].image").unwrap();
        assert!(p.is_floating());
        assert!(p.matches(&path(&["spec", "containers", "0", "image"])));
        assert!(p.matches(&path(&[
            "spec", "template", "spec", "containers", "2", "image"
        ])));
        assert!(!p.matches(&path(&["image"])));
    }

    #[test]
    fn test_specificity_order() {
        let literal = RulePattern::parse("spec.containers[0].image").unwrap();
        let wildcard = RulePattern::parse("spec.containers[*].image").unwrap();
        let floating = RulePattern::parse("..containers[0].image").unwrap();
        let short_floating = RulePattern::parse("..image").unwrap();
        let floating_wildcard = RulePattern::parse("..containers[*].image").unwrap();

        assert!(literal.specificity() > wildcard.specificity());
        assert!(wildcard.specificity() > floating.specificity());
        assert!(floating.specificity() > floating_wildcard.specificity());
        assert!(floating_wildcard.specificity() > short_floating.specificity());
    }

    #[test]
    fn test_to_field_path() {
        let p = RulePattern::parse(r#"metadata.labels["app.kubernetes.io/name"]"#).unwrap();
        let expected = FieldPath::root()
            .key("metadata")
            .key("labels")
            .key("app.kubernetes.io/name");
        assert_eq!(p.to_field_path(), Some(expected));

        let indexed = RulePattern::parse("spec.containers[1].name").unwrap();
        assert_eq!(
            indexed.to_field_path(),
            Some(FieldPath::root().key("spec").key("containers").index(1).key("name"))
        );

        assert!(RulePattern::parse("spec.containers[*].name").unwrap().to_field_path().is_none());
        assert!(RulePattern::parse("..name").unwrap().to_field_path().is_none());
    }

    #[test]
    fn test_display_round_trips_source() {
        let p: RulePattern = "..labels".parse().unwrap();
        assert_eq!(p.to_string(), "..labels");
    }
}

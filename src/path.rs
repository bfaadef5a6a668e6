//! Dotted path keys → ordered segments.
//!
//! `user.name.first` is three object keys; `names.*.first` descends into the
//! elements of the `names` array. There is no escaping: every `.` splits.

use std::fmt;

use crate::error::CompileError;

pub const WILDCARD: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    /// "each element of this array"
    WildcardArray,
}

impl Segment {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::WildcardArray)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::WildcardArray => f.write_str(WILDCARD),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathSegments(Vec<Segment>);

impl PathSegments {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Dotted spelling of the first `n` segments.
    pub fn prefix(&self, n: usize) -> String {
        join(&self.0[..n.min(self.0.len())])
    }
}

impl fmt::Display for PathSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.0))
    }
}

fn join(segments: &[Segment]) -> String {
    segments.iter().map(Segment::to_string).collect::<Vec<_>>().join(".")
}

/// Split a dotted key. Fails on an empty path, an empty segment (`a..b`, `a.`),
/// or a leading wildcard: the root is always an object, so `*` cannot start a path.
pub fn parse(path: &str) -> Result<PathSegments, CompileError> {
    if path.is_empty() {
        return Err(CompileError::malformed(path, "path is empty"));
    }
    let mut out = Vec::new();
    for (i, raw) in path.split('.').enumerate() {
        let segment = match raw {
            "" => return Err(CompileError::malformed(path, format!("segment {} is empty", i + 1))),
            WILDCARD if i == 0 => {
                return Err(CompileError::malformed(path, "a path cannot start with the `*` wildcard"));
            }
            WILDCARD => Segment::WildcardArray,
            key => Segment::Key(key.to_string()),
        };
        out.push(segment);
    }
    Ok(PathSegments(out))
}

/// Patch and path types shared by the diff and apply sides.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step into a nested value: a mapping key or a sequence index.
///
/// Serializes untagged, so a full path round-trips as a plain JSON array
/// of strings and integers, e.g. `["nested", "b"]` or `["items", 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Key into a mapping.
    Key(String),
    /// Index into a sequence.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single structural change against a nested value.
///
/// Tagged by `op` on the wire:
/// `{"op": "replace", "path": ["a"], "value": 10}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Patch {
    /// Insert a new key into a mapping, or insert-and-shift at a sequence
    /// index (`index == len` appends).
    Add {
        path: Vec<PathSegment>,
        value: Value,
    },
    /// Overwrite the existing value at the path. An empty path replaces
    /// the root value wholesale.
    Replace {
        path: Vec<PathSegment>,
        value: Value,
    },
    /// Delete a mapping key, or remove-and-shift a sequence index.
    Remove { path: Vec<PathSegment> },
}

impl Patch {
    /// The path this patch addresses.
    pub fn path(&self) -> &[PathSegment] {
        match self {
            Patch::Add { path, .. } | Patch::Replace { path, .. } | Patch::Remove { path } => path,
        }
    }
}

/// Formats a path as a pointer-like string for error messages.
pub(crate) fn format_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return String::from("/");
    }
    let mut out = String::new();
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Key(key) => out.push_str(key),
            PathSegment::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

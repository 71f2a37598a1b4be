/// Error type for patch application failures.
use thiserror::Error;

/// Raised when a patch cannot be realized against the value it is applied
/// to, e.g. after importing a snapshot whose current value no longer
/// matches the shapes its history entries reference.
///
/// Application never mutates its input, so a caller observing this error
/// still holds the value it started with.
#[derive(Debug, Clone, Error)]
pub enum PatchError {
    /// A referenced mapping key does not exist, or a traversed segment is
    /// absent.
    #[error("no value at path `{0}`")]
    PathNotFound(String),
    /// A segment keyed into a sequence, indexed into a mapping, or
    /// descended into a scalar.
    #[error("path `{path}` expects a {expected}, found {found}")]
    KindMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A terminal sequence index was past the end.
    #[error("index {index} out of bounds at path `{path}` (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
    /// `add` and `remove` cannot target the root value itself.
    #[error("cannot {op} the root value")]
    RootNotAddressable { op: &'static str },
}

/// Applies patch sequences to values.
use serde_json::Value;

use crate::error::PatchError;
use crate::patch::{format_path, Patch, PathSegment};

/// Applies `patches` front to back and returns the resulting value.
///
/// Works on a clone of `value`: on failure the caller's value is untouched
/// and no partially patched result escapes.
///
/// # Errors
///
/// Returns a [`PatchError`] if any patch references a location that does
/// not exist in the value produced by the preceding patches.
pub fn apply_patches(value: &Value, patches: &[Patch]) -> Result<Value, PatchError> {
    let mut next = value.clone();
    for patch in patches {
        apply_patch(&mut next, patch)?;
    }
    Ok(next)
}

/// Applies a single patch in place.
fn apply_patch(target: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    match patch {
        Patch::Replace { path, value } if path.is_empty() => {
            *target = value.clone();
            Ok(())
        }
        Patch::Add { path, .. } if path.is_empty() => {
            Err(PatchError::RootNotAddressable { op: "add" })
        }
        Patch::Remove { path } if path.is_empty() => {
            Err(PatchError::RootNotAddressable { op: "remove" })
        }
        Patch::Add { path, value } => {
            let (parent, last) = descend(target, path)?;
            insert_at(parent, last, value.clone(), path)
        }
        Patch::Replace { path, value } => {
            let (parent, last) = descend(target, path)?;
            replace_at(parent, last, value.clone(), path)
        }
        Patch::Remove { path } => {
            let (parent, last) = descend(target, path)?;
            remove_at(parent, last, path)
        }
    }
}

/// Walks to the parent of the addressed location.
fn descend<'a, 'p>(
    root: &'a mut Value,
    path: &'p [PathSegment],
) -> Result<(&'a mut Value, &'p PathSegment), PatchError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(PatchError::PathNotFound(format_path(path)));
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map
                .get_mut(key)
                .ok_or_else(|| PatchError::PathNotFound(format_path(&path[..=depth])))?,
            (Value::Array(seq), PathSegment::Index(index)) => seq
                .get_mut(*index)
                .ok_or_else(|| PatchError::PathNotFound(format_path(&path[..=depth])))?,
            (found, segment) => return Err(kind_mismatch(found, segment, &path[..=depth])),
        };
    }
    Ok((current, last))
}

/// Inserts `value` at `segment` within `parent`.
fn insert_at(
    parent: &mut Value,
    segment: &PathSegment,
    value: Value,
    full_path: &[PathSegment],
) -> Result<(), PatchError> {
    match (parent, segment) {
        (Value::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(seq), PathSegment::Index(index)) => {
            if *index > seq.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: format_path(full_path),
                    index: *index,
                    len: seq.len(),
                });
            }
            seq.insert(*index, value);
            Ok(())
        }
        (found, segment) => Err(kind_mismatch(found, segment, full_path)),
    }
}

/// Overwrites the existing value at `segment` within `parent`.
fn replace_at(
    parent: &mut Value,
    segment: &PathSegment,
    value: Value,
    full_path: &[PathSegment],
) -> Result<(), PatchError> {
    match (parent, segment) {
        (Value::Object(map), PathSegment::Key(key)) => match map.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PatchError::PathNotFound(format_path(full_path))),
        },
        (Value::Array(seq), PathSegment::Index(index)) => {
            let len = seq.len();
            match seq.get_mut(*index) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(PatchError::IndexOutOfBounds {
                    path: format_path(full_path),
                    index: *index,
                    len,
                }),
            }
        }
        (found, segment) => Err(kind_mismatch(found, segment, full_path)),
    }
}

/// Removes the value at `segment` within `parent`.
fn remove_at(
    parent: &mut Value,
    segment: &PathSegment,
    full_path: &[PathSegment],
) -> Result<(), PatchError> {
    match (parent, segment) {
        (Value::Object(map), PathSegment::Key(key)) => {
            if map.remove(key).is_none() {
                return Err(PatchError::PathNotFound(format_path(full_path)));
            }
            Ok(())
        }
        (Value::Array(seq), PathSegment::Index(index)) => {
            if *index >= seq.len() {
                return Err(PatchError::IndexOutOfBounds {
                    path: format_path(full_path),
                    index: *index,
                    len: seq.len(),
                });
            }
            seq.remove(*index);
            Ok(())
        }
        (found, segment) => Err(kind_mismatch(found, segment, full_path)),
    }
}

fn kind_mismatch(found: &Value, segment: &PathSegment, path: &[PathSegment]) -> PatchError {
    let expected = match segment {
        PathSegment::Key(_) => "mapping",
        PathSegment::Index(_) => "sequence",
    };
    PatchError::KindMismatch {
        path: format_path(path),
        expected,
        found: kind_of(found),
    }
}

/// Human-readable kind name for error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Diff-based patch generation.
///
/// Mutations are expressed against a mutable draft of the base value.
/// Structurally diffing base against draft yields forward patches
/// (base → next) and inverse patches (next → base), so producers never
/// manage diffs by hand.
use serde_json::Value;

use crate::patch::{Patch, PathSegment};

/// Runs `mutate` against a draft of `base` and returns the produced value
/// together with its forward and inverse patch sequences.
///
/// Patches address the deepest changed subtree, so untouched siblings are
/// never rewritten. A mutator that changes nothing yields empty sequences.
/// Applying `forward` to `base` yields the produced value; applying
/// `inverse` to the produced value yields `base` again, exactly.
pub fn produce_with_patches<F>(base: &Value, mutate: F) -> (Value, Vec<Patch>, Vec<Patch>)
where
    F: FnOnce(&mut Value),
{
    let mut draft = base.clone();
    mutate(&mut draft);

    let mut forward = Vec::new();
    let mut inverse = Vec::new();
    diff(base, &draft, &mut Vec::new(), &mut forward, &mut inverse);
    (draft, forward, inverse)
}

/// Recursively diffs `old` against `new` at `path`.
fn diff(
    old: &Value,
    new: &Value,
    path: &mut Vec<PathSegment>,
    forward: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    if old == new {
        return;
    }

    match (old, new) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old_value) in before {
                match after.get(key) {
                    Some(new_value) => {
                        path.push(PathSegment::Key(key.clone()));
                        diff(old_value, new_value, path, forward, inverse);
                        path.pop();
                    }
                    None => {
                        let removed = child(path, PathSegment::Key(key.clone()));
                        forward.push(Patch::Remove {
                            path: removed.clone(),
                        });
                        inverse.push(Patch::Add {
                            path: removed,
                            value: old_value.clone(),
                        });
                    }
                }
            }
            for (key, new_value) in after {
                if !before.contains_key(key) {
                    let added = child(path, PathSegment::Key(key.clone()));
                    forward.push(Patch::Add {
                        path: added.clone(),
                        value: new_value.clone(),
                    });
                    inverse.push(Patch::Remove { path: added });
                }
            }
        }
        (Value::Array(before), Value::Array(after)) => {
            let shared = before.len().min(after.len());
            for i in 0..shared {
                path.push(PathSegment::Index(i));
                diff(&before[i], &after[i], path, forward, inverse);
                path.pop();
            }
            // A grown tail adds in ascending index order; the inverse must
            // remove from the end first so indices stay valid.
            for i in shared..after.len() {
                forward.push(Patch::Add {
                    path: child(path, PathSegment::Index(i)),
                    value: after[i].clone(),
                });
            }
            for i in (shared..after.len()).rev() {
                inverse.push(Patch::Remove {
                    path: child(path, PathSegment::Index(i)),
                });
            }
            // A shrunk tail removes from the end first; the inverse re-adds
            // in ascending order.
            for i in (shared..before.len()).rev() {
                forward.push(Patch::Remove {
                    path: child(path, PathSegment::Index(i)),
                });
            }
            for i in shared..before.len() {
                inverse.push(Patch::Add {
                    path: child(path, PathSegment::Index(i)),
                    value: before[i].clone(),
                });
            }
        }
        _ => {
            forward.push(Patch::Replace {
                path: path.clone(),
                value: new.clone(),
            });
            inverse.push(Patch::Replace {
                path: path.clone(),
                value: old.clone(),
            });
        }
    }
}

fn child(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut extended = path.to_vec();
    extended.push(segment);
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_patches;
    use serde_json::json;

    /// Produces and checks both directions of the patch pair.
    fn produce_and_verify<F>(base: Value, mutate: F) -> (Value, Vec<Patch>, Vec<Patch>)
    where
        F: FnOnce(&mut Value),
    {
        let (next, forward, inverse) = produce_with_patches(&base, mutate);
        assert_eq!(apply_patches(&base, &forward).expect("forward"), next);
        assert_eq!(apply_patches(&next, &inverse).expect("inverse"), base);
        (next, forward, inverse)
    }

    #[test]
    fn test_no_change_produces_no_patches() {
        let (next, forward, inverse) = produce_and_verify(json!({"a": 1}), |_| {});
        assert_eq!(next, json!({"a": 1}));
        assert!(forward.is_empty());
        assert!(inverse.is_empty());
    }

    #[test]
    fn test_scalar_field_change_is_single_replace() {
        let (next, forward, inverse) = produce_and_verify(json!({"a": 1, "b": 2}), |draft| {
            draft["a"] = json!(10);
        });
        assert_eq!(next, json!({"a": 10, "b": 2}));
        assert_eq!(forward.len(), 1);
        assert_eq!(
            forward[0],
            Patch::Replace {
                path: vec![PathSegment::from("a")],
                value: json!(10),
            }
        );
        assert_eq!(
            inverse[0],
            Patch::Replace {
                path: vec![PathSegment::from("a")],
                value: json!(1),
            }
        );
    }

    #[test]
    fn test_nested_change_addresses_deepest_subtree() {
        let (_, forward, _) =
            produce_and_verify(json!({"a": 1, "nested": {"b": 2, "c": 3}}), |draft| {
                draft["nested"]["b"] = json!(20);
            });
        assert_eq!(forward.len(), 1);
        assert_eq!(
            forward[0].path(),
            &[PathSegment::from("nested"), PathSegment::from("b")]
        );
    }

    #[test]
    fn test_added_key_round_trips() {
        let (next, forward, inverse) = produce_and_verify(json!({"a": 1}), |draft| {
            draft["b"] = json!({"x": true});
        });
        assert_eq!(next, json!({"a": 1, "b": {"x": true}}));
        assert!(matches!(forward[0], Patch::Add { .. }));
        assert!(matches!(inverse[0], Patch::Remove { .. }));
    }

    #[test]
    fn test_removed_key_round_trips() {
        let base = json!({"a": 1, "b": 2});
        let (next, forward, inverse) = produce_and_verify(base, |draft| {
            draft.as_object_mut().expect("object").remove("b");
        });
        assert_eq!(next, json!({"a": 1}));
        assert!(matches!(forward[0], Patch::Remove { .. }));
        assert!(matches!(inverse[0], Patch::Add { .. }));
    }

    #[test]
    fn test_sequence_growth_round_trips() {
        let (next, forward, _) = produce_and_verify(json!({"items": [1]}), |draft| {
            let items = draft["items"].as_array_mut().expect("array");
            items.push(json!(2));
            items.push(json!(3));
        });
        assert_eq!(next, json!({"items": [1, 2, 3]}));
        assert_eq!(forward.len(), 2);
    }

    #[test]
    fn test_sequence_shrink_round_trips() {
        produce_and_verify(json!([1, 2, 3, 4]), |draft| {
            draft.as_array_mut().expect("array").truncate(1);
        });
    }

    #[test]
    fn test_sequence_element_change_recurses() {
        let (_, forward, _) = produce_and_verify(json!([{"v": 1}, {"v": 2}]), |draft| {
            draft[1]["v"] = json!(20);
        });
        assert_eq!(forward.len(), 1);
        assert_eq!(
            forward[0].path(),
            &[PathSegment::from(1usize), PathSegment::from("v")]
        );
    }

    #[test]
    fn test_sequence_shrink_and_edit_round_trips() {
        produce_and_verify(json!([1, 2, 3, 4]), |draft| {
            let items = draft.as_array_mut().expect("array");
            items.truncate(2);
            items[0] = json!(100);
        });
    }

    #[test]
    fn test_kind_change_is_root_replace() {
        let (next, forward, inverse) = produce_and_verify(json!({"a": 1}), |draft| {
            *draft = json!([1, 2]);
        });
        assert_eq!(next, json!([1, 2]));
        assert_eq!(forward, vec![Patch::Replace { path: vec![], value: json!([1, 2]) }]);
        assert_eq!(
            inverse,
            vec![Patch::Replace { path: vec![], value: json!({"a": 1}) }]
        );
    }

    #[test]
    fn test_multiple_independent_changes() {
        produce_and_verify(json!({"a": 1, "b": [1, 2], "c": {"d": true}}), |draft| {
            draft["a"] = json!("text");
            draft["b"].as_array_mut().expect("array").push(json!(3));
            draft["c"]["d"] = json!(false);
            draft["e"] = json!(null);
        });
    }
}

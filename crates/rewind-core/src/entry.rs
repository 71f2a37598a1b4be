/// Wire types for history entries and snapshots.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rewind_patch::Patch;

/// A single undoable step: the patches that realize it and the patches
/// that exactly revert it.
///
/// `M` is caller-supplied descriptive metadata (a label, a command name);
/// the engine records it verbatim and never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<M> {
    /// Patches transforming the value before this entry into the value
    /// after it, applied front to back.
    pub forward_patches: Vec<Patch>,
    /// Patches transforming the value after this entry back into the
    /// value before it, applied front to back.
    pub inverse_patches: Vec<Patch>,
    /// Opaque caller metadata recorded with the entry.
    pub meta: Option<M>,
}

/// Undo and redo stacks as captured by a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot<M> {
    /// Undo stack, oldest entry first; undo pops from the tail.
    pub undo_stack: Vec<HistoryEntry<M>>,
    /// Redo stack, most recently undone entry at the tail.
    pub redo_stack: Vec<HistoryEntry<M>>,
}

impl<M> Default for HistorySnapshot<M> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

/// The full externally observable engine state.
///
/// This is the only shape the engine exchanges: exporting and importing a
/// snapshot into a fresh engine reproduces identical history behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<M> {
    /// The current value.
    pub present: Value,
    /// Both history stacks.
    pub history: HistorySnapshot<M>,
}

/// The history engine: stack discipline and transaction buffering.
use std::fmt;

use serde_json::Value;

use rewind_patch::{apply_patches, produce_with_patches, Patch, PatchError};

use crate::entry::{HistoryEntry, HistorySnapshot, Snapshot};

/// Buffered state of an open transaction.
struct TxnBuffer<M> {
    /// Forward patches in call order.
    forward: Vec<Patch>,
    /// Inverse patches in reverse-chronological order, so front-to-back
    /// application undoes the newest sub-mutation first.
    inverse: Vec<Patch>,
    /// Pending metadata for the eventual entry; last writer wins.
    meta: Option<M>,
}

/// Undo/redo engine over a single immutable JSON-like value.
///
/// The engine owns the current value outright: every change replaces it
/// wholesale with the value produced by the patch generator, and the
/// patch pair for the change lands on the undo stack (or in the open
/// transaction buffer). Stacks grow without bound until
/// [`clear_history`](HistoryEngine::clear_history) or
/// [`import_state`](HistoryEngine::import_state) replaces them.
///
/// Misuse is lenient: undoing with an empty stack or closing a
/// transaction that is not open reports `false` rather than failing.
/// Only patch application against an incompatible value errors, with
/// [`PatchError`], and a failed operation leaves the engine unchanged.
///
/// The engine is synchronous and keeps no internal locking; a host
/// sharing one instance across threads provides its own mutual exclusion.
pub struct HistoryEngine<M> {
    present: Value,
    undo_stack: Vec<HistoryEntry<M>>,
    redo_stack: Vec<HistoryEntry<M>>,
    /// `Some` while a transaction is open; transactions never nest.
    txn: Option<TxnBuffer<M>>,
}

impl<M> fmt::Debug for HistoryEngine<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("undo_len", &self.undo_stack.len())
            .field("redo_len", &self.redo_stack.len())
            .field("in_transaction", &self.txn.is_some())
            .finish()
    }
}

impl<M> HistoryEngine<M> {
    /// Creates an engine managing `initial` with empty history.
    pub fn new(initial: Value) -> Self {
        Self {
            present: initial,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            txn: None,
        }
    }

    /// Creates an engine primed with a previously exported snapshot.
    pub fn from_snapshot(snapshot: Snapshot<M>) -> Self {
        let mut engine = Self::new(Value::Null);
        engine.import_state(snapshot);
        engine
    }

    /// Read-only view of the current value.
    pub fn present(&self) -> &Value {
        &self.present
    }

    /// Read-only view of the undo stack, oldest entry first.
    pub fn undo_stack(&self) -> &[HistoryEntry<M>] {
        &self.undo_stack
    }

    /// Read-only view of the redo stack, most recently undone entry last.
    pub fn redo_stack(&self) -> &[HistoryEntry<M>] {
        &self.redo_stack
    }

    /// Whether at least one entry can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether at least one entry can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Applies a mutation to the current value.
    ///
    /// `mutate` receives a draft of the current value and edits it freely.
    /// Outside a transaction the resulting patch pair is pushed onto the
    /// undo stack and the redo stack is cleared. Inside a transaction the
    /// forward patches are appended to the buffer in call order, the
    /// inverse patches are prepended, and a `Some` meta overwrites the
    /// buffered meta. The current value is replaced immediately either
    /// way.
    pub fn set<F>(&mut self, mutate: F, meta: Option<M>)
    where
        F: FnOnce(&mut Value),
    {
        let (next, forward, inverse) = produce_with_patches(&self.present, mutate);
        match &mut self.txn {
            Some(buffer) => {
                buffer.forward.extend(forward);
                buffer.inverse.splice(0..0, inverse);
                if meta.is_some() {
                    buffer.meta = meta;
                }
            }
            None => {
                self.undo_stack.push(HistoryEntry {
                    forward_patches: forward,
                    inverse_patches: inverse,
                    meta,
                });
                self.redo_stack.clear();
            }
        }
        self.present = next;
    }

    /// Undoes the newest entry, moving it to the redo stack.
    ///
    /// Returns `Ok(false)` with no effect if the undo stack is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] if the entry's inverse patches no longer
    /// apply to the current value (possible after importing an
    /// incompatible snapshot). The engine is left unchanged in that case.
    pub fn undo(&mut self) -> Result<bool, PatchError> {
        let Some(entry) = self.undo_stack.last() else {
            return Ok(false);
        };
        let restored = apply_patches(&self.present, &entry.inverse_patches)?;
        // Stacks move only once the patches have applied cleanly.
        if let Some(entry) = self.undo_stack.pop() {
            self.redo_stack.push(entry);
        }
        self.present = restored;
        Ok(true)
    }

    /// Redoes the most recently undone entry, moving it back to the undo
    /// stack. Mirror of [`undo`](HistoryEngine::undo), using the entry's
    /// forward patches.
    ///
    /// Returns `Ok(false)` with no effect if the redo stack is empty.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] if the entry's forward patches no longer
    /// apply to the current value.
    pub fn redo(&mut self) -> Result<bool, PatchError> {
        let Some(entry) = self.redo_stack.last() else {
            return Ok(false);
        };
        let advanced = apply_patches(&self.present, &entry.forward_patches)?;
        if let Some(entry) = self.redo_stack.pop() {
            self.undo_stack.push(entry);
        }
        self.present = advanced;
        Ok(true)
    }

    /// Empties both stacks.
    ///
    /// The current value and any open transaction are untouched.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Opens a transaction that buffers subsequent
    /// [`set`](HistoryEngine::set) calls into a single undoable entry.
    ///
    /// Returns `false` if a transaction is already open: the call and its
    /// `meta` are silently absorbed into the existing transaction.
    pub fn begin_transaction(&mut self, meta: Option<M>) -> bool {
        if self.txn.is_some() {
            return false;
        }
        self.txn = Some(TxnBuffer {
            forward: Vec::new(),
            inverse: Vec::new(),
            meta,
        });
        true
    }

    /// Commits the open transaction as a single history entry.
    ///
    /// Returns `true` iff an entry was committed. A transaction with no
    /// buffered mutations closes without touching either stack, and with
    /// no transaction open the call is a no-op.
    pub fn end_transaction(&mut self) -> bool {
        let Some(buffer) = self.txn.take() else {
            return false;
        };
        if buffer.forward.is_empty() {
            return false;
        }
        self.undo_stack.push(HistoryEntry {
            forward_patches: buffer.forward,
            inverse_patches: buffer.inverse,
            meta: buffer.meta,
        });
        self.redo_stack.clear();
        true
    }

    /// Reverts the current value to its pre-transaction state and
    /// discards the open transaction. Neither stack is modified; the net
    /// effect is as if the transaction never started.
    ///
    /// Returns `Ok(false)` with no effect if no transaction is open.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] if the buffered inverse patches fail to
    /// apply; the transaction then stays open and the value is unchanged.
    pub fn rollback_transaction(&mut self) -> Result<bool, PatchError> {
        let Some(buffer) = &self.txn else {
            return Ok(false);
        };
        let restored = apply_patches(&self.present, &buffer.inverse)?;
        self.present = restored;
        self.txn = None;
        Ok(true)
    }

    /// Captures the current value and copies of both stacks.
    ///
    /// The copies are independent containers: later engine operations
    /// never change which entries an exported snapshot holds.
    pub fn export_state(&self) -> Snapshot<M>
    where
        M: Clone,
    {
        Snapshot {
            present: self.present.clone(),
            history: HistorySnapshot {
                undo_stack: self.undo_stack.clone(),
                redo_stack: self.redo_stack.clone(),
            },
        }
    }

    /// Replaces the current value and both stacks with the snapshot's
    /// contents.
    ///
    /// An open transaction is discarded: its buffered inverse patches
    /// reference the value the import just replaced and can never apply
    /// consistently afterwards.
    pub fn import_state(&mut self, snapshot: Snapshot<M>) {
        if self.txn.take().is_some() {
            tracing::warn!("open transaction discarded by state import");
        }
        self.present = snapshot.present;
        self.undo_stack = snapshot.history.undo_stack;
        self.redo_stack = snapshot.history.redo_stack;
    }
}

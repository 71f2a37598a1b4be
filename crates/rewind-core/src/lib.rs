/// Transactional undo/redo over an immutable JSON-like value.
///
/// Provides a [`HistoryEngine`] that owns a single current value, records
/// every committed mutation as a forward/inverse patch pair on an undo
/// stack, and batches mutations made inside an open transaction into one
/// undoable entry. The full engine state round-trips through [`Snapshot`].
pub mod engine;
pub mod entry;

pub use engine::HistoryEngine;
pub use entry::{HistoryEntry, HistorySnapshot, Snapshot};

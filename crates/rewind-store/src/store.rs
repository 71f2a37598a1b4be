/// Subscriber-backed store owning a history engine.
use std::fmt;

use serde_json::Value;

use rewind_core::{HistoryEngine, HistoryEntry, Snapshot};
use rewind_patch::PatchError;

/// Identifier returned by [`HistoryStore::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&Value)>;

/// Reactive store that routes every state change through a
/// [`HistoryEngine`] and pushes the resulting value to subscribers before
/// the triggering call returns.
///
/// The store is synchronous and single-threaded, like the engine it
/// wraps: a host sharing one instance across threads must provide its own
/// mutual exclusion. Subscribers run in registration order and only for
/// operations that actually replaced the current value; a no-op undo or
/// redo notifies nobody.
pub struct HistoryStore<M> {
    engine: HistoryEngine<M>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription_id: SubscriptionId,
}

impl<M> fmt::Debug for HistoryStore<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("engine", &self.engine)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<M> HistoryStore<M> {
    /// Creates a store managing `initial` with empty history and no
    /// subscribers.
    pub fn new(initial: Value) -> Self {
        Self {
            engine: HistoryEngine::new(initial),
            subscribers: Vec::new(),
            next_subscription_id: 0,
        }
    }

    /// The host-visible current value.
    pub fn state(&self) -> &Value {
        self.engine.present()
    }

    /// Registers a subscriber invoked with the new value after every
    /// change. Returns an id for [`unsubscribe`](HistoryStore::unsubscribe).
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Value) + 'static,
    {
        let id = self.next_subscription_id;
        self.next_subscription_id = self.next_subscription_id.saturating_add(1);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Applies a mutation through the engine and notifies subscribers.
    ///
    /// See [`HistoryEngine::set`] for transaction buffering and metadata
    /// semantics.
    pub fn set<F>(&mut self, mutate: F, meta: Option<M>)
    where
        F: FnOnce(&mut Value),
    {
        self.engine.set(mutate, meta);
        self.notify();
    }

    /// External "set state" entry point for hosts that hand over a value
    /// rather than a mutator.
    ///
    /// When both the current value and `partial` are mappings, `partial`'s
    /// top-level keys are merged over the current value; otherwise the
    /// value is replaced wholesale. Routed through
    /// [`set`](HistoryStore::set), so the change is undoable like any
    /// other.
    pub fn set_state(&mut self, partial: Value) {
        self.set(move |draft| merge_state(draft, partial), None);
    }

    /// Undoes the newest entry. Subscribers are notified only when an
    /// entry was actually undone.
    ///
    /// # Errors
    ///
    /// Propagates [`PatchError`] from the engine; the store state is
    /// unchanged in that case.
    pub fn undo(&mut self) -> Result<bool, PatchError> {
        let changed = self.engine.undo()?;
        if changed {
            self.notify();
        }
        Ok(changed)
    }

    /// Redoes the most recently undone entry. Subscribers are notified
    /// only when an entry was actually redone.
    ///
    /// # Errors
    ///
    /// Propagates [`PatchError`] from the engine; the store state is
    /// unchanged in that case.
    pub fn redo(&mut self) -> Result<bool, PatchError> {
        let changed = self.engine.redo()?;
        if changed {
            self.notify();
        }
        Ok(changed)
    }

    /// Opens a transaction. See [`HistoryEngine::begin_transaction`].
    pub fn begin_transaction(&mut self, meta: Option<M>) -> bool {
        self.engine.begin_transaction(meta)
    }

    /// Commits the open transaction. The current value is already live,
    /// so no notification fires. See [`HistoryEngine::end_transaction`].
    pub fn end_transaction(&mut self) -> bool {
        self.engine.end_transaction()
    }

    /// Rolls back the open transaction, notifying subscribers when the
    /// value was reverted. See [`HistoryEngine::rollback_transaction`].
    ///
    /// # Errors
    ///
    /// Propagates [`PatchError`] from the engine.
    pub fn rollback_transaction(&mut self) -> Result<bool, PatchError> {
        let reverted = self.engine.rollback_transaction()?;
        if reverted {
            self.notify();
        }
        Ok(reverted)
    }

    /// Empties both history stacks without touching the current value.
    pub fn clear_history(&mut self) {
        self.engine.clear_history();
    }

    /// Captures the engine's full state. See [`HistoryEngine::export_state`].
    pub fn export_state(&self) -> Snapshot<M>
    where
        M: Clone,
    {
        self.engine.export_state()
    }

    /// Replaces the engine's full state and notifies subscribers with the
    /// imported value. See [`HistoryEngine::import_state`].
    pub fn import_state(&mut self, snapshot: Snapshot<M>) {
        self.engine.import_state(snapshot);
        self.notify();
    }

    /// Read-only view of the undo stack, oldest entry first.
    pub fn undo_stack(&self) -> &[HistoryEntry<M>] {
        self.engine.undo_stack()
    }

    /// Read-only view of the redo stack, most recently undone entry last.
    pub fn redo_stack(&self) -> &[HistoryEntry<M>] {
        self.engine.redo_stack()
    }

    /// Whether at least one entry can be undone.
    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    /// Whether at least one entry can be redone.
    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.engine.in_transaction()
    }

    /// Pushes the current value to every subscriber in registration order.
    fn notify(&mut self) {
        let present = self.engine.present();
        for (_, subscriber) in &mut self.subscribers {
            subscriber(present);
        }
    }
}

/// Merges `partial`'s top-level keys over `draft` when both are mappings;
/// otherwise replaces the value wholesale.
fn merge_state(draft: &mut Value, partial: Value) {
    match (draft, partial) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                current.insert(key, value);
            }
        }
        (draft, partial) => *draft = partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store(initial: Value) -> HistoryStore<String> {
        HistoryStore::new(initial)
    }

    /// Subscribes a recorder that appends every observed value.
    fn record(store: &mut HistoryStore<String>) -> (SubscriptionId, Rc<RefCell<Vec<Value>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |value| sink.borrow_mut().push(value.clone()));
        (id, seen)
    }

    #[test]
    fn test_set_notifies_with_new_value() {
        let mut store = store(json!({"a": 1}));
        let (_, seen) = record(&mut store);

        store.set(|draft| draft["a"] = json!(2), None);
        store.set(|draft| draft["a"] = json!(3), None);

        assert_eq!(
            *seen.borrow(),
            vec![json!({"a": 2}), json!({"a": 3})]
        );
        assert_eq!(store.state(), &json!({"a": 3}));
    }

    #[test]
    fn test_undo_redo_notify_only_on_effect() {
        let mut store = store(json!({"a": 1}));
        store.set(|draft| draft["a"] = json!(2), None);
        let (_, seen) = record(&mut store);

        assert!(store.undo().expect("undo"));
        assert!(!store.undo().expect("undo past empty"));
        assert!(store.redo().expect("redo"));
        assert!(!store.redo().expect("redo past empty"));

        assert_eq!(
            *seen.borrow(),
            vec![json!({"a": 1}), json!({"a": 2})]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = store(json!({"a": 1}));
        let (id, seen) = record(&mut store);

        store.set(|draft| draft["a"] = json!(2), None);
        assert!(store.unsubscribe(id));
        store.set(|draft| draft["a"] = json!(3), None);

        assert_eq!(seen.borrow().len(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let mut store = store(json!(0));
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        store.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&order);
        store.subscribe(move |_| second.borrow_mut().push("second"));

        store.set(|draft| *draft = json!(1), None);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_set_state_merges_mappings() {
        let mut store = store(json!({"a": 1, "b": 2}));
        store.set_state(json!({"b": 20, "c": 30}));

        assert_eq!(store.state(), &json!({"a": 1, "b": 20, "c": 30}));

        // Merged updates are undoable like any mutator-based set.
        store.undo().expect("undo");
        assert_eq!(store.state(), &json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_set_state_replaces_non_mappings() {
        let mut store = store(json!({"a": 1}));
        store.set_state(json!([1, 2, 3]));
        assert_eq!(store.state(), &json!([1, 2, 3]));

        store.undo().expect("undo");
        assert_eq!(store.state(), &json!({"a": 1}));
    }

    #[test]
    fn test_transaction_surface_routes_through_engine() {
        let mut store = store(json!({"a": 1}));
        let (_, seen) = record(&mut store);

        assert!(store.begin_transaction(Some("batch".to_string())));
        store.set(|draft| draft["a"] = json!(2), None);
        store.set(|draft| draft["b"] = json!(true), None);
        assert!(store.in_transaction());
        assert!(store.end_transaction());

        assert_eq!(store.undo_stack().len(), 1);
        assert_eq!(store.undo_stack()[0].meta.as_deref(), Some("batch"));
        // One notification per buffered set; none for the commit itself.
        assert_eq!(seen.borrow().len(), 2);

        store.undo().expect("undo");
        assert_eq!(store.state(), &json!({"a": 1}));
    }

    #[test]
    fn test_rollback_notifies_with_reverted_value() {
        let mut store = store(json!({"a": 1}));
        store.begin_transaction(None);
        store.set(|draft| draft["a"] = json!(99), None);

        let (_, seen) = record(&mut store);
        assert!(store.rollback_transaction().expect("rollback"));
        assert!(!store.rollback_transaction().expect("idle rollback"));

        assert_eq!(*seen.borrow(), vec![json!({"a": 1})]);
        assert_eq!(store.undo_stack().len(), 0);
    }

    #[test]
    fn test_export_import_through_adapter() {
        let mut source = store(json!({"a": 1}));
        source.set(|draft| draft["a"] = json!(2), Some("step".to_string()));
        let snapshot = source.export_state();

        let mut target = store(json!(null));
        let (_, seen) = record(&mut target);
        target.import_state(snapshot);

        assert_eq!(target.state(), &json!({"a": 2}));
        assert_eq!(*seen.borrow(), vec![json!({"a": 2})]);

        target.undo().expect("undo");
        assert_eq!(target.state(), &json!({"a": 1}));
    }

    #[test]
    fn test_clear_history_keeps_state() {
        let mut store = store(json!({"a": 1}));
        store.set(|draft| draft["a"] = json!(2), None);
        store.clear_history();

        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert_eq!(store.state(), &json!({"a": 2}));
    }
}

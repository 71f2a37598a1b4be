/// Store adapter binding a history engine to host-visible reactive state.
pub mod store;

pub use store::{HistoryStore, SubscriptionId};

//! Persisted calculation history.

mod store;

pub use store::{HISTORY_CAPACITY, HistoryEntry, HistoryError, HistoryStore};

pub mod filter;
pub mod slot;
pub mod store;

pub use filter::{derive_view, HistoryFilter, HistorySummary};
pub use slot::{InMemorySlot, JsonFileSlot, StorageSlot};
pub use store::{RecordStore, SaveStatus, STORAGE_FULL_WARNING};

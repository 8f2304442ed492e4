//! The persisted collection of purchase records.

use std::collections::HashSet;

use anyhow::{Context, Result};
use pricesnap_core::{ProductRecord, SnapError};
use tracing::{debug, info, warn};

use crate::slot::StorageSlot;

/// Message shown when a write to the storage slot fails.
pub const STORAGE_FULL_WARNING: &str =
    "Could not save your records; storage may be full. Changes are kept for this session only.";

/// Outcome of persisting the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    /// The write failed; the in-memory collection is still authoritative.
    Unsaved { warning: String },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Saved => None,
            Self::Unsaved { warning } => Some(warning),
        }
    }
}

/// Records kept most recent first, written back in full after every change.
pub struct RecordStore<S: StorageSlot> {
    slot: S,
    records: Vec<ProductRecord>,
}

impl<S: StorageSlot> RecordStore<S> {
    /// Read the persisted collection. Unreadable or corrupt data yields an empty store.
    pub fn load(slot: S) -> Self {
        let records = match read_records(&slot) {
            Ok(records) => dedupe_ids(records),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to load saved records; starting empty");
                Vec::new()
            }
        };
        info!(count = records.len(), "Loaded records");
        Self { slot, records }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ProductRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Overwrite the slot with the full collection.
    pub fn save(&self) -> SaveStatus {
        let result = serde_json::to_string(&self.records)
            .context("Failed to serialize records")
            .and_then(|json| self.slot.write(&json));
        match result {
            Ok(()) => {
                debug!(count = self.records.len(), "Saved records");
                SaveStatus::Saved
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to save records");
                SaveStatus::Unsaved {
                    warning: STORAGE_FULL_WARNING.to_string(),
                }
            }
        }
    }

    /// Prepend a record and persist. Ids must be unique.
    pub fn add(&mut self, record: ProductRecord) -> Result<SaveStatus, SnapError> {
        if self.get(&record.id).is_some() {
            return Err(SnapError::DuplicateId(record.id));
        }
        info!(id = %record.id, name = %record.name, price = record.price, "Adding record");
        self.records.insert(0, record);
        Ok(self.save())
    }

    /// Remove the record with `id` and persist. `None` if no record matched.
    pub fn remove(&mut self, id: &str) -> Option<(ProductRecord, SaveStatus)> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(index);
        info!(id = %removed.id, name = %removed.name, "Removed record");
        Some((removed, self.save()))
    }
}

fn read_records(slot: &dyn StorageSlot) -> Result<Vec<ProductRecord>> {
    match slot.read()? {
        None => Ok(Vec::new()),
        Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw).context("Saved records are not a valid record list"),
    }
}

/// Keep the first occurrence of each id.
fn dedupe_ids(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let unique: Vec<ProductRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if unique.len() != before {
        warn!(dropped = before - unique.len(), "Dropped records with duplicate ids");
    }
    unique
}

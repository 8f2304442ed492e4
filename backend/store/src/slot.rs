//! Durable storage for the serialized record collection.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

/// A single named slot holding one serialized document.
pub trait StorageSlot: Send + Sync {
    /// Current contents, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the contents.
    fn write(&self, contents: &str) -> Result<()>;
}

/// A JSON file on disk. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageSlot for JsonFileSlot {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Storage file does not exist yet");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path.display()))?;
        Ok(Some(raw))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create storage directory: {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents.as_bytes())
            .with_context(|| format!("Failed to write temp storage file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to rename temp storage file to: {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory slot for tests. Clones share the same contents, so a clone can
/// stand in for a restarted process reading what an earlier one saved.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlot {
    contents: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        let slot = Self::default();
        if let Ok(mut guard) = slot.contents.lock() {
            *guard = Some(contents.into());
        }
        slot
    }

    /// Make subsequent writes fail, as a full quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl StorageSlot for InMemorySlot {
    fn read(&self) -> Result<Option<String>> {
        let guard = self.contents.lock().map_err(|_| anyhow!("storage slot lock poisoned"))?;
        Ok(guard.clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("quota exceeded");
        }
        let mut guard = self.contents.lock().map_err(|_| anyhow!("storage slot lock poisoned"))?;
        *guard = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_slot_reads_none_before_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let slot = JsonFileSlot::new(dir.path().join("records.json"));
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn file_slot_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let slot = JsonFileSlot::new(dir.path().join("nested").join("records.json"));
        slot.write("[1]").unwrap();
        slot.write("[2]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[2]"));
        assert!(!dir.path().join("nested").join("records.json.tmp").exists());
    }

    #[test]
    fn memory_slot_clones_share_contents() {
        let slot = InMemorySlot::new();
        let other = slot.clone();
        slot.write("hello").unwrap();
        assert_eq!(other.read().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn memory_slot_can_refuse_writes() {
        let slot = InMemorySlot::with_contents("old");
        slot.set_fail_writes(true);
        assert!(slot.write("new").is_err());
        assert_eq!(slot.contents().as_deref(), Some("old"));
    }
}

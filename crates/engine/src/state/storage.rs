use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use super::atomic_io::{remove_save, write_save_atomic};

/// Name of the single key the game state lives under.
pub const STATE_KEY: &str = "pupPalGameState";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read save '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write save '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to clear save '{path}': {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("in-memory store rejected the write")]
    Rejected,
}

/// Single-slot key-value storage for the serialized state record.
pub trait StateStore {
    /// `Ok(None)` means nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&mut self, contents: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STATE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&mut self, contents: &str) -> Result<(), StoreError> {
        write_save_atomic(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        remove_save(&self.path).map_err(|source| StoreError::Clear {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Default)]
struct MemorySlot {
    contents: Option<String>,
    reject_writes: bool,
    writes: u32,
}

/// In-process store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<MemorySlot>>,
}

impl MemoryStore {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::default();
        store.slot.borrow_mut().contents = Some(contents.into());
        store
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().contents.clone()
    }

    pub fn write_count(&self) -> u32 {
        self.slot.borrow().writes
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.slot.borrow_mut().reject_writes = reject;
    }
}

impl StateStore for MemoryStore {
    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.borrow().contents.clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), StoreError> {
        let mut slot = self.slot.borrow_mut();
        if slot.reject_writes {
            return Err(StoreError::Rejected);
        }
        slot.contents = Some(contents.to_string());
        slot.writes = slot.writes.saturating_add(1);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.slot.borrow_mut().contents = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_reads_none_before_first_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::in_dir(dir.path());
        assert!(store.read().expect("read").is_none());
        assert!(store.path().ends_with("pupPalGameState.json"));
    }

    #[test]
    fn file_store_write_read_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::in_dir(dir.path());

        store.write("{\"day\":2}").expect("write");
        assert_eq!(store.read().expect("read").as_deref(), Some("{\"day\":2}"));

        store.clear().expect("clear");
        assert!(store.read().expect("read").is_none());
    }

    #[test]
    fn memory_store_clones_share_slot_and_can_reject() {
        let observer = MemoryStore::default();
        let mut writer = observer.clone();

        writer.write("a").expect("write");
        assert_eq!(observer.contents().as_deref(), Some("a"));

        observer.set_reject_writes(true);
        assert!(matches!(writer.write("b"), Err(StoreError::Rejected)));
        assert_eq!(observer.contents().as_deref(), Some("a"));
        assert_eq!(observer.write_count(), 1);
    }
}

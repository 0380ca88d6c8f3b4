//! High-score persistence backends.
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::HighScoreStorage;
use crate::constants::HIGH_SCORE_FILE_NAME;
use crate::highscore::HighScoreTable;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("high-score file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("high-score data malformed: {0}")]
    Malformed(String),
    #[error("high-score data could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file holding the full table, rewritten on every save.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default file name inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(HIGH_SCORE_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStorage for FileStorage {
    type Error = StorageError;

    fn load_table(&self) -> Result<Option<HighScoreTable>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Malformed(format!("{}: {err}", self.path.display())))
    }

    fn save_table(&self, table: &HighScoreTable) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let payload = table.to_json()?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// In-process storage; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<HighScoreTable>>>,
    saves: Rc<Cell<usize>>,
    failure: Option<String>,
}

impl MemoryStorage {
    /// Storage whose every load and save fails with `reason`.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_table(table: HighScoreTable) -> Self {
        let storage = Self::default();
        *storage.slot.borrow_mut() = Some(table);
        storage
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<HighScoreTable> {
        self.slot.borrow().clone()
    }
}

impl HighScoreStorage for MemoryStorage {
    type Error = StorageError;

    fn load_table(&self) -> Result<Option<HighScoreTable>, Self::Error> {
        if let Some(reason) = &self.failure {
            return Err(StorageError::Malformed(reason.clone()));
        }
        Ok(self.slot.borrow().clone())
    }

    fn save_table(&self, table: &HighScoreTable) -> Result<(), Self::Error> {
        if let Some(reason) = &self.failure {
            return Err(StorageError::Malformed(reason.clone()));
        }
        *self.slot.borrow_mut() = Some(table.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

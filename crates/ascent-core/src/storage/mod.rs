mod config;
pub mod database;

pub use config::{
    Config, DisciplineConfig, HorizonConfig, MentorConfig, RetentionConfig, MIN_SCORE_HISTORY,
};
pub use database::Database;

use std::cell::RefCell;
use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::state::Snapshot;

/// Returns the data directory, creating it if needed.
///
/// `ASCENT_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/ascent[-dev]/`, with the `-dev` suffix when `ASCENT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("ASCENT_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ASCENT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ascent-dev")
            } else {
                base_dir.join("ascent")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Key-value persistence collaborator for engine snapshots.
pub trait SnapshotStore {
    /// The previously saved snapshot, if any.
    fn load(&self) -> Result<Option<Snapshot>>;

    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved snapshot in its serialized form.
    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.raw
            .borrow()
            .as_deref()
            .map(Snapshot::from_json)
            .transpose()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        *self.raw.borrow_mut() = Some(snapshot.to_json()?);
        Ok(())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        let mut snapshot = Snapshot::default();
        snapshot.core.xp = 77;
        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap().unwrap().core.xp, 77);
    }
}

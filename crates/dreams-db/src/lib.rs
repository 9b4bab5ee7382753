pub mod channels;
pub mod dms;
pub mod error;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod password;
pub mod reactions;
pub mod repository;
pub mod sessions;
pub mod sqlite;
pub mod users;

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use tracing::info;

pub use error::{DbError, DbResult};
pub use models::Snapshot;
pub use repository::{JsonFileRepository, MemoryRepository, Repository};
pub use sqlite::SqliteRepository;

/// The whole messaging store behind one lock.
///
/// Every public operation holds the lock from its first check to the end of
/// persistence, so operations are serialized.
pub struct Database {
    tables: Mutex<Snapshot>,
    repo: Box<dyn Repository>,
}

impl Database {
    pub fn open<R>(repo: R) -> anyhow::Result<Self>
    where
        R: Repository + 'static,
    {
        let tables = repo.load()?.unwrap_or_default();

        info!(
            "Store loaded: {} users, {} channels, {} dms, {} messages",
            tables.users.len(),
            tables.channels.len(),
            tables.dms.len(),
            tables.messages.len()
        );
        Ok(Self {
            tables: Mutex::new(tables),
            repo: Box::new(repo),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            tables: Mutex::new(Snapshot::default()),
            repo: Box::new(MemoryRepository::default()),
        }
    }

    pub fn with_tables<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Snapshot) -> DbResult<T>,
    {
        let tables = self.lock()?;
        f(&tables)
    }

    /// Runs `f` against a draft copy; the draft is saved and swapped in only
    /// if `f` and the save both succeed.
    ///
    /// Every mutation clones the whole store, so it costs O(store) time and
    /// memory regardless of how little `f` changes.
    pub fn with_tables_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Snapshot) -> DbResult<T>,
    {
        let mut tables = self.lock()?;
        let mut draft = tables.clone();
        let out = f(&mut draft)?;

        self.repo.save(&draft)?;
        *tables = draft;
        Ok(out)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Snapshot>> {
        self.tables
            .lock()
            .map_err(|e| DbError::Storage(anyhow!("store lock poisoned: {}", e)))
    }
}

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::models::Snapshot;

/// Loads and saves the whole store as a single snapshot.
pub trait Repository: Send + Sync {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;

    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Keeps the last saved snapshot in memory. Used by tests and `DREAMS_STORE=memory`.
#[derive(Default)]
pub struct MemoryRepository {
    saved: Mutex<Option<Snapshot>>,
}

impl Repository for MemoryRepository {
    fn load(&self) -> Result<Option<Snapshot>> {
        let saved = self.saved.lock().map_err(|e| anyhow!("repository lock poisoned: {}", e))?;
        Ok(saved.clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut saved = self.saved.lock().map_err(|e| anyhow!("repository lock poisoned: {}", e))?;
        *saved = Some(snapshot.clone());
        Ok(())
    }
}

/// One JSON document on disk, replaced atomically on every save.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Repository for JsonFileRepository {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let snapshot = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let data = serde_json::to_vec(snapshot)?;

        // Write to a sibling temp file, then rename over the old snapshot
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!("Snapshot written to {} ({} bytes)", self.path.display(), data.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreams_types::models::{ChannelId, UserId};

    use crate::models::ChannelRow;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.channels.insert(
            ChannelId(0),
            ChannelRow {
                id: ChannelId(0),
                name: "general".into(),
                is_public: true,
                owner_members: vec![UserId(0)],
                all_members: vec![UserId(0), UserId(3)],
            },
        );
        snapshot.next_message_id = 7;
        snapshot
    }

    #[test]
    fn json_file_missing_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("absent.json"));
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn json_file_keeps_id_keyed_tables() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("dreams.json"));
        repo.save(&sample()).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        let channel = &loaded.channels[&ChannelId(0)];
        assert_eq!(channel.all_members, vec![UserId(0), UserId(3)]);
        assert_eq!(loaded.next_message_id, 7);
        assert!(!dir.path().join("dreams.json.tmp").exists());
    }

    #[test]
    fn json_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dreams.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(JsonFileRepository::new(path).load().is_err());
    }

    #[test]
    fn memory_repository_returns_last_save() {
        let repo = MemoryRepository::default();
        assert!(repo.load().unwrap().is_none());
        repo.save(&sample()).unwrap();
        assert_eq!(repo.load().unwrap().unwrap().channels.len(), 1);
    }
}

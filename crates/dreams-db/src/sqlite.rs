use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::migrations;
use crate::models::Snapshot;
use crate::repository::Repository;

/// Stores the snapshot as a single row of a SQLite database.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

impl Repository for SqliteRepository {
    fn load(&self) -> Result<Option<Snapshot>> {
        self.with_conn(|conn| {
            let body: Option<String> = conn
                .query_row("SELECT body FROM snapshots WHERE id = 1", [], |row| row.get(0))
                .optional()?;

            body.map(|b| serde_json::from_str::<Snapshot>(&b).context("parsing stored snapshot"))
                .transpose()
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_string(snapshot)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO snapshots (id, body) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = datetime('now')",
                [&body],
            )?;
            debug!("Snapshot row updated ({} bytes)", body.len());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreams_types::models::{DmId, UserId};

    use crate::models::DmRow;

    #[test]
    fn empty_database_has_no_snapshot() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn save_overwrites_single_row() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let mut snapshot = Snapshot::default();
        repo.save(&snapshot).unwrap();

        snapshot.dms.insert(
            DmId(4),
            DmRow {
                id: DmId(4),
                name: "ab, cd".into(),
                creator: UserId(1),
                members: vec![UserId(1), UserId(2)],
            },
        );
        snapshot.next_dm_id = 5;
        repo.save(&snapshot).unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded.next_dm_id, 5);
        assert_eq!(loaded.dms[&DmId(4)].name, "ab, cd");

        let rows: i64 = repo
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM snapshots", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn reopening_file_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dreams.db");
        {
            let repo = SqliteRepository::open(&path).unwrap();
            let mut snapshot = Snapshot::default();
            snapshot.next_message_id = 42;
            repo.save(&snapshot).unwrap();
        }
        let repo = SqliteRepository::open(&path).unwrap();
        assert_eq!(repo.load().unwrap().unwrap().next_message_id, 42);
    }
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- The whole store is one JSON document; id = 1 is the only row.
        CREATE TABLE IF NOT EXISTS snapshots (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            body        TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

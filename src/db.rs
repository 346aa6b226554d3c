use crate::ratelimit::{LimitState, LimitStore, STORAGE_KEY};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("rosterd.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, serde_json::to_string(value)?, now),
    )?;
    Ok(())
}

/// Limiter state kept in the workspace settings table, so it survives
/// restarts. Stored as the same JSON the web client keeps under `wa_global_limit`.
pub struct SettingsLimitStore<'a> {
    pub conn: &'a Connection,
}

impl LimitStore for SettingsLimitStore<'_> {
    fn load(&self) -> anyhow::Result<LimitState> {
        match settings_get_json(self.conn, STORAGE_KEY)? {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(LimitState::default()),
        }
    }

    fn save(&self, state: &LimitState) -> anyhow::Result<()> {
        settings_set_json(self.conn, STORAGE_KEY, &serde_json::to_value(state)?)
    }
}

//! SQLite-backed session persistence.
//!
//! One row per session: queryable lifecycle columns plus the full session
//! document as JSON in the `data` column, measurement order preserved by
//! array order. Writes replace the whole row, so concurrent writers to the
//! same id resolve last-write-wins at the record level.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::SurveySession;
use crate::store::SessionRepository;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "timbertally")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("timbertally.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    fn query_sessions(&self, sql: &str) -> Result<Vec<SurveySession>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(sql)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|data| {
                serde_json::from_str(&data).context("Failed to deserialize session record")
            })
            .collect()
    }
}

impl SessionRepository for Database {
    fn load(&self, id: Uuid) -> Result<Option<SurveySession>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT data FROM sessions WHERE id = ?")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let data: String = row.get(0)?;
            let session =
                serde_json::from_str(&data).context("Failed to deserialize session record")?;
            Ok(Some(session))
        } else {
            Ok(None)
        }
    }

    fn save(&self, session: &SurveySession) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let data = serde_json::to_string(session)?;

        conn.execute(
            "INSERT INTO sessions (id, kind, started_at_ms, ended_at_ms, is_paused, data)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 kind = excluded.kind,
                 started_at_ms = excluded.started_at_ms,
                 ended_at_ms = excluded.ended_at_ms,
                 is_paused = excluded.is_paused,
                 data = excluded.data",
            (
                session.id.to_string(),
                session.kind.as_str(),
                session.started_at_ms,
                session.ended_at_ms,
                if session.is_paused { 1 } else { 0 },
                &data,
            ),
        )?;

        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM sessions WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn list(&self) -> Result<Vec<SurveySession>> {
        self.query_sessions("SELECT data FROM sessions ORDER BY started_at_ms DESC")
    }

    fn list_active(&self) -> Result<Vec<SurveySession>> {
        self.query_sessions(
            "SELECT data FROM sessions WHERE ended_at_ms IS NULL ORDER BY started_at_ms DESC",
        )
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

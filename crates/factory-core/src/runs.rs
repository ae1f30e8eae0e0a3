//! Persistent run metadata: one row per generation or edit attempt.
//!
//! Stored in a SQLite database next to the project directories, so run
//! history survives the process and later edit invocations can look up a
//! project's framework and features without re-asking the user.

use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// RunStatus / RunRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Completed,
    Deployed,
    Failed,
    Edited,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Deployed => "deployed",
            RunStatus::Failed => "failed",
            RunStatus::Edited => "edited",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub project_name: String,
    pub framework: String,
    pub features: String,
    pub status: String,
    pub deployment_url: Option<String>,
    pub notes: Option<String>,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// What a later edit invocation needs to know about a generated project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetadata {
    pub framework: String,
    pub features: String,
}

// ---------------------------------------------------------------------------
// RunStore
// ---------------------------------------------------------------------------

pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    /// Open or create the database at `path`, ensuring the table exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS project_generations (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                project_name   TEXT NOT NULL,
                framework      TEXT NOT NULL,
                features       TEXT NOT NULL,
                status         TEXT NOT NULL,
                deployment_url TEXT,
                notes          TEXT,
                started_at     TEXT NOT NULL,
                finished_at    TEXT
            )",
        )?;
        Ok(Self { conn })
    }

    /// Record the start of a run; returns the new row id.
    pub fn record_start(&self, project: &str, framework: &str, features: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO project_generations
                (project_name, framework, features, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project,
                framework,
                features,
                RunStatus::InProgress.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark a run finished with the given terminal status.
    pub fn finish(
        &self,
        id: i64,
        status: RunStatus,
        deployment_url: Option<&str>,
        notes: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE project_generations
                SET status = ?2, deployment_url = ?3, notes = ?4, finished_at = ?5
              WHERE id = ?1",
            params![
                id,
                status.as_str(),
                deployment_url,
                notes,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn mark_deployed(&self, id: i64, deployment_url: Option<&str>) -> Result<()> {
        self.finish(id, RunStatus::Deployed, deployment_url, None)
    }

    pub fn mark_failed(&self, id: i64, notes: &str) -> Result<()> {
        self.finish(id, RunStatus::Failed, None, Some(notes))
    }

    /// All runs, most recent first.
    pub fn list(&self) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_name, framework, features, status,
                    deployment_url, notes, started_at, finished_at
               FROM project_generations
              ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RunRecord {
                id: row.get(0)?,
                project_name: row.get(1)?,
                framework: row.get(2)?,
                features: row.get(3)?,
                status: row.get(4)?,
                deployment_url: row.get(5)?,
                notes: row.get(6)?,
                started_at: row.get(7)?,
                finished_at: row.get(8)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Framework and features of the most recent run for `project`, if any.
    pub fn latest_for_project(&self, project: &str) -> Result<Option<ProjectMetadata>> {
        let row = self
            .conn
            .query_row(
                "SELECT framework, features
                   FROM project_generations
                  WHERE project_name = ?1
                  ORDER BY id DESC
                  LIMIT 1",
                params![project],
                |row| {
                    Ok(ProjectMetadata {
                        framework: row.get(0)?,
                        features: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RunStore {
        RunStore::open(&dir.path().join("projects.db")).unwrap()
    }

    #[test]
    fn open_is_idempotent() {
        let dir = TempDir::new().unwrap();
        store(&dir);
        store(&dir);
    }

    #[test]
    fn record_and_list() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let id = s.record_start("todo", "Next.js", "auth, todos table").unwrap();
        assert!(id > 0);

        let runs = s.list().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].project_name, "todo");
        assert_eq!(runs[0].status, "in_progress");
        assert!(runs[0].finished_at.is_none());
    }

    #[test]
    fn mark_deployed_sets_url_and_finish_time() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let id = s.record_start("todo", "Next.js", "f").unwrap();
        s.mark_deployed(id, Some("https://todo.vercel.app")).unwrap();

        let run = &s.list().unwrap()[0];
        assert_eq!(run.status, "deployed");
        assert_eq!(run.deployment_url.as_deref(), Some("https://todo.vercel.app"));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn mark_failed_records_notes() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let id = s.record_start("todo", "Flask", "f").unwrap();
        s.mark_failed(id, "planning agent crashed").unwrap();

        let run = &s.list().unwrap()[0];
        assert_eq!(run.status, "failed");
        assert_eq!(run.notes.as_deref(), Some("planning agent crashed"));
    }

    #[test]
    fn list_is_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.record_start("first", "Flask", "f").unwrap();
        s.record_start("second", "Next.js", "f").unwrap();
        let runs = s.list().unwrap();
        assert_eq!(runs[0].project_name, "second");
        assert_eq!(runs[1].project_name, "first");
    }

    #[test]
    fn latest_for_project_returns_newest_metadata() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.record_start("todo", "Flask", "old features").unwrap();
        s.record_start("todo", "Next.js", "new features").unwrap();
        s.record_start("other", "Flask", "x").unwrap();

        let meta = s.latest_for_project("todo").unwrap().unwrap();
        assert_eq!(meta.framework, "Next.js");
        assert_eq!(meta.features, "new features");
    }

    #[test]
    fn latest_for_unknown_project_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).latest_for_project("ghost").unwrap().is_none());
    }
}

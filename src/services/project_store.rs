use std::collections::BTreeMap;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::models::{ParsedBusinessPlan, ProjectStatus};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS project_data (
        project_id TEXT NOT NULL,
        data_type TEXT NOT NULL,
        data TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (project_id, data_type)
    );
";

/// Per-project section storage: one JSON payload per (project, section).
pub struct ProjectStore {
    conn: Mutex<Connection>,
}

impl ProjectStore {
    /// Opens (or creates) the database at `path`; `:memory:` gives a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self, AppError> {
        info!("Opening project store at {}", path);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| {
            error!("Failed to open database {}: {}", path, e);
            AppError::Database(e.to_string())
        })?;

        conn.execute_batch(SCHEMA)?;
        debug!("Project store schema ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, AppError> {
        Self::open(":memory:")
    }

    /// Replaces the payload stored for `(project_id, section)`.
    pub fn replace_section(&self, project_id: &str, section: &str, payload: &Value) -> Result<(), AppError> {
        let data = serde_json::to_string(payload)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO project_data (project_id, data_type, data, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![project_id, section, data, now()],
        )?;
        debug!("Stored section {} for project {}", section, project_id);
        Ok(())
    }

    /// Drops every stored section of the project and writes the present
    /// sections of `plan`, atomically.
    pub fn replace_plan(&self, project_id: &str, plan: &ParsedBusinessPlan) -> Result<usize, AppError> {
        let sections = plan.sections()?;
        let created_at = now();

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM project_data WHERE project_id = ?1", params![project_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO project_data (project_id, data_type, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (section, payload) in &sections {
                stmt.execute(params![project_id, section, serde_json::to_string(payload)?, created_at])?;
            }
        }
        tx.commit()?;

        info!(
            "Stored {} sections for project {} (replaced {})",
            sections.len(),
            project_id,
            removed
        );
        Ok(sections.len())
    }

    pub fn load_sections(&self, project_id: &str) -> Result<BTreeMap<String, Value>, AppError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT data_type, data FROM project_data WHERE project_id = ?1")?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut sections = BTreeMap::new();
        for row in rows {
            let (section, data) = row?;
            sections.insert(section, serde_json::from_str(&data)?);
        }
        Ok(sections)
    }

    /// Records the processing status, creating the project row if needed.
    pub fn set_status(&self, project_id: &str, status: ProjectStatus) -> Result<(), AppError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO projects (id, status, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at",
            params![project_id, status.as_str(), now()],
        )?;
        info!("Project {} status -> {}", project_id, status.as_str());
        Ok(())
    }

    pub fn status(&self, project_id: &str) -> Result<Option<ProjectStatus>, AppError> {
        let conn = self.conn.lock();
        let raw: Option<String> = conn
            .query_row(
                "SELECT status FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(raw) => ProjectStatus::parse(&raw)
                .map(Some)
                .ok_or_else(|| AppError::Database(format!("Unknown project status '{}'", raw))),
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

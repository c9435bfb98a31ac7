use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::sync::Mutex;

use crate::types::{Draft, JurisdictionDecision, ModerationStatus, StepKind, StepResult};

const SCHEMA_SQL: &str = include_str!("../../../schema.sql");

pub struct Db {
    conn: Mutex<Connection>,
}

// ── Timestamp helpers ─────────────────────────────────────────────────────

fn parse_ts(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

fn now_str() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Row mappers ───────────────────────────────────────────────────────────

fn parse_json(raw: Option<String>) -> Option<Value> {
    raw.as_deref().and_then(|s| serde_json::from_str(s).ok())
}

fn row_to_draft(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draft> {
    let status: String = row.get(6)?;
    let analyzer: Option<String> = row.get(7)?;
    let data: Option<String> = row.get(8)?;
    let submitted: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    Ok(Draft {
        id: row.get(0)?,
        user_email: row.get(1)?,
        file_name: row.get(2)?,
        text: row.get(3)?,
        model: row.get(4)?,
        case_citation: row.get(5)?,
        moderation_status: ModerationStatus::parse(&status).unwrap_or(ModerationStatus::Draft),
        analyzer: parse_json(analyzer),
        data: parse_json(data),
        submitted_data: parse_json(submitted),
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

const DRAFT_COLUMNS: &str = "id, user_email, file_name, text, model, case_citation, \
     moderation_status, analyzer, data, submitted_data, created_at, updated_at";

/// Read-modify-write on the analyzer JSON column. Must run under the
/// connection lock so concurrent step writes cannot lose entries.
fn merge_analyzer(conn: &Connection, id: i64, key: &str, value: Value) -> Result<()> {
    let existing: Option<Option<String>> = conn
        .query_row(
            "SELECT analyzer FROM case_analyzer_drafts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .context("merge_analyzer read")?;
    let Some(raw) = existing else {
        anyhow::bail!("draft {id} not found");
    };
    let mut map = match parse_json(raw) {
        Some(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    map.insert(key.to_string(), value);
    conn.execute(
        "UPDATE case_analyzer_drafts SET analyzer = ?1, updated_at = ?2 WHERE id = ?3",
        params![Value::Object(map).to_string(), now_str(), id],
    )
    .context("merge_analyzer write")?;
    Ok(())
}

impl Db {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open SQLite database at {path:?}"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("failed to set PRAGMAs")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn migrate(&mut self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to apply schema migrations")?;
        // Columns added after the first release get bolted on here.
        // SQLite errors when a column already exists; ignore that.
        let alters = [
            "ALTER TABLE case_analyzer_drafts ADD COLUMN model TEXT",
            "ALTER TABLE case_analyzer_drafts ADD COLUMN analyzer TEXT",
            "ALTER TABLE case_analyzer_drafts ADD COLUMN submitted_data TEXT",
        ];
        for sql in alters {
            let _ = conn.execute(sql, []);
        }
        Ok(())
    }

    // ── Drafts ────────────────────────────────────────────────────────────

    pub fn create_draft(
        &self,
        user_email: &str,
        file_name: &str,
        text: &str,
        model: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let now = now_str();
        conn.execute(
            "INSERT INTO case_analyzer_drafts \
             (user_email, file_name, text, model, moderation_status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, 'draft', ?5, ?5)",
            params![user_email, file_name, text, model, now],
        )
        .context("create_draft")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_draft(&self, id: i64) -> Result<Option<Draft>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let result = conn
            .query_row(
                &format!("SELECT {DRAFT_COLUMNS} FROM case_analyzer_drafts WHERE id = ?1"),
                params![id],
                row_to_draft,
            )
            .optional()
            .context("get_draft")?;
        Ok(result)
    }

    pub fn update_jurisdiction(&self, id: i64, decision: &JurisdictionDecision) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let value = serde_json::to_value(decision).context("serialize jurisdiction")?;
        merge_analyzer(&conn, id, "jurisdiction", value)
    }

    /// Store one completed step under its name in the analyzer column. The
    /// citation string is mirrored to its own column for listing queries.
    pub fn record_step(&self, id: i64, kind: StepKind, payload: &Value) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        merge_analyzer(&conn, id, kind.as_str(), payload.clone())?;
        if kind == StepKind::CaseCitation {
            if let Some(citation) = payload.get("citation").and_then(Value::as_str) {
                conn.execute(
                    "UPDATE case_analyzer_drafts SET case_citation = ?1 WHERE id = ?2",
                    params![citation, id],
                )
                .context("record_step citation mirror")?;
            }
        }
        Ok(())
    }

    /// Record the step a fatal run died on, for display on reload.
    pub fn record_error(&self, id: i64, step: &str, message: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        merge_analyzer(
            &conn,
            id,
            "error",
            serde_json::json!({ "step": step, "message": message }),
        )
    }

    /// Status lives in its own column and as a mirror inside the analyzer
    /// JSON; both are written here so either reader sees the same state.
    pub fn set_moderation_status(&self, id: i64, status: ModerationStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        merge_analyzer(
            &conn,
            id,
            "moderation_status",
            Value::String(status.as_str().to_string()),
        )?;
        conn.execute(
            "UPDATE case_analyzer_drafts SET moderation_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now_str(), id],
        )
        .context("set_moderation_status")?;
        Ok(())
    }

    pub fn set_submitted_data(&self, id: i64, payload: &Value) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE case_analyzer_drafts SET submitted_data = ?1, updated_at = ?2 WHERE id = ?3",
            params![payload.to_string(), now_str(), id],
        )
        .context("set_submitted_data")?;
        Ok(())
    }

    pub fn set_model(&self, id: i64, model: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "UPDATE case_analyzer_drafts SET model = ?1, updated_at = ?2 WHERE id = ?3",
            params![model, now_str(), id],
        )
        .context("set_model")?;
        Ok(())
    }

    /// Typed step results for resume, from either storage shape.
    pub fn get_step_results(&self, id: i64) -> Result<HashMap<StepKind, StepResult>> {
        let draft = self
            .get_draft(id)?
            .with_context(|| format!("draft {id} not found"))?;
        Ok(draft.step_results())
    }
}

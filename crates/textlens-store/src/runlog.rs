//! Durable log of agent runs.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde_json::Value;
use tracing::debug;

use crate::open_connection;
use crate::schema::run_log_schema_sql;
use crate::types::RunRecord;
use textlens_core::{Error, Result};

/// One SQLite table of `(run_id, ts, query, answer, support)` rows.
pub struct RunLog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    table: String,
}

impl RunLog {
    /// Open the database at `db_path`. The table name is interpolated into
    /// SQL, so it must be a plain identifier.
    pub fn open(db_path: impl AsRef<Path>, table: &str) -> Result<Self> {
        if !is_identifier(table) {
            return Err(Error::Config(format!("invalid run log table name: {:?}", table)));
        }
        let db_path = db_path.as_ref().to_path_buf();
        let conn = open_connection(&db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the table and its index if missing.
    pub fn ensure_table(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(&run_log_schema_sql(&self.table))
            .map_err(|e| Error::Database(format!("Run log init failed: {}", e)))?;
        debug!("Run log ready: {} in {}", self.table, self.db_path.display());
        Ok(())
    }

    /// Append a run with a fresh id and the current UTC time.
    pub fn log_run(&self, query: &str, answer: &str, support: &Value) -> Result<RunRecord> {
        let record = RunRecord {
            run_id: uuid::Uuid::new_v4().to_string(),
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            query: query.to_string(),
            answer: answer.to_string(),
            support: serde_json::to_string(support)?,
        };
        let sql = format!(
            r#"INSERT INTO "{}" (run_id, ts, query, answer, support) VALUES (?1, ?2, ?3, ?4, ?5)"#,
            self.table
        );
        self.conn
            .lock()
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![
                record.run_id,
                record.ts,
                record.query,
                record.answer,
                record.support
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(record)
    }

    /// Most recent runs first.
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let sql = format!(
            r#"SELECT run_id, ts, query, answer, support FROM "{}" ORDER BY ts DESC, rowid DESC LIMIT ?1"#,
            self.table
        );
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RunRecord {
                    run_id: row.get(0)?,
                    ts: row.get(1)?,
                    query: row.get(2)?,
                    answer: row.get(3)?,
                    support: row.get(4)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_validation() {
        assert!(is_identifier("agent_runs"));
        assert!(is_identifier("_t2"));
        assert!(!is_identifier("2runs"));
        assert!(!is_identifier("runs; DROP TABLE x"));
        assert!(!is_identifier(""));

        let dir = tempfile::tempdir().unwrap();
        let err = RunLog::open(dir.path().join("runs.db"), "bad-name").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_log_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::open(dir.path().join("nested/runs.db"), "agent_runs").unwrap();
        log.ensure_table().unwrap();
        log.ensure_table().unwrap();

        let support = json!([{"row_index": 1, "summary": "Battery dies fast"}]);
        let first = log.log_run("battery?", "It drains.", &support).unwrap();
        let second = log.log_run("screen?", "It cracks.", &json!([])).unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert!(chrono::DateTime::parse_from_rfc3339(&first.ts).is_ok());

        let recent = log.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0], second);
        assert_eq!(recent[1].query, "battery?");
        let stored: Value = serde_json::from_str(&recent[1].support).unwrap();
        assert_eq!(stored, support);

        assert_eq!(log.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn test_log_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::open(dir.path().join("runs.db"), "missing").unwrap();
        let err = log.log_run("q", "a", &json!([])).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}

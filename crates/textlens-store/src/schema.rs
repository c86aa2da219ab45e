//! Database schema SQL.

/// Vector memory: one row per distinct text.
pub const MEMORY_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS memory_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    metadata_json TEXT,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_memory_hash ON memory_entries(content_hash);
"#;

/// Run-log table DDL for a validated table name.
pub fn run_log_schema_sql(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{table}" (
    run_id TEXT PRIMARY KEY,
    ts TEXT NOT NULL,
    query TEXT NOT NULL,
    answer TEXT NOT NULL,
    support TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_{table}_ts" ON "{table}"(ts);
"#
    )
}

//! SQLite vector memory.
//!
//! Texts are deduplicated by SHA-256 content hash. Embeddings are stored as
//! uint8 with scale/offset and searched by cosine similarity against a
//! normalized in-memory matrix that is reloaded lazily after writes.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::open_connection;
use crate::quantize::Quantized;
use crate::schema::MEMORY_SCHEMA_SQL;
use crate::types::{MemoryHit, Upsert};
use textlens_core::{Error, Result};

pub const MEMORY_DB_FILE: &str = "memory.db";

pub struct MemoryStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    dim: usize,
    matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    /// Normalized embeddings, shape (N, dim).
    rows: Array2<f32>,
    ids: Vec<i64>,
    dirty: bool,
}

impl MemoryStore {
    /// Open or create `{dir}/memory.db` for embeddings of size `dim`.
    pub fn open(dir: impl AsRef<Path>, dim: usize) -> Result<Self> {
        let db_path = dir.as_ref().join(MEMORY_DB_FILE);
        let conn = open_connection(&db_path)?;
        conn.execute_batch(MEMORY_SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            dim,
            matrix: Mutex::new(EmbeddingMatrix {
                rows: Array2::zeros((0, dim)),
                ids: Vec::new(),
                dirty: true,
            }),
        };
        info!(
            "MemoryStore opened: {} entries, dim={}, path={}",
            store.count()?,
            dim,
            store.db_path.display()
        );
        Ok(store)
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Store `text` with `metadata`, or merge `metadata` into the existing
    /// entry when the same text is already stored.
    pub fn upsert(&self, text: &str, metadata: &Value, embedding: &Array1<f32>) -> Result<Upsert> {
        if embedding.len() != self.dim {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dim,
                embedding.len()
            )));
        }
        let hash = content_hash(text);
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock();

        let existing: Option<(i64, Option<String>)> = conn
            .prepare_cached("SELECT id, metadata_json FROM memory_entries WHERE content_hash = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![hash], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;

        if let Some((id, old_json)) = existing {
            let merged = merge_metadata(old_json.as_deref(), metadata);
            conn.prepare_cached(
                "UPDATE memory_entries SET metadata_json = ?1, updated_at = ?2 WHERE id = ?3",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![merged.to_string(), now, id])
            .map_err(|e| Error::Database(e.to_string()))?;
            debug!("Merged metadata into memory entry {}", id);
            return Ok(Upsert::Merged(id));
        }

        let q = Quantized::from_embedding(embedding);
        let id = conn
            .prepare_cached(
                "INSERT INTO memory_entries (text, content_hash, metadata_json, embedding, scale, offset_val, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                text,
                hash,
                metadata.to_string(),
                q.bytes,
                q.scale as f64,
                q.offset as f64,
                now
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(conn);

        self.matrix.lock().dirty = true;
        Ok(Upsert::Inserted(id))
    }

    /// The `k` entries most similar to `query`, best first.
    pub fn search(&self, query: &Array1<f32>, k: usize) -> Result<Vec<MemoryHit>> {
        if query.len() != self.dim {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dim,
                query.len()
            )));
        }
        self.ensure_matrix_loaded()?;

        let norm = query.dot(query).sqrt();
        if norm < 1e-9 || k == 0 {
            return Ok(Vec::new());
        }
        let q = query / norm;

        let top: Vec<(i64, f64)> = {
            let mat = self.matrix.lock();
            if mat.rows.nrows() == 0 {
                return Ok(Vec::new());
            }
            let sims = mat.rows.dot(&q);
            let mut indexed: Vec<(usize, f32)> = sims.iter().copied().enumerate().collect();
            indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            indexed.truncate(k);
            indexed
                .into_iter()
                .map(|(i, s)| (mat.ids[i], s as f64))
                .collect()
        };

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT text, metadata_json FROM memory_entries WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?;
        let mut hits = Vec::with_capacity(top.len());
        for (id, score) in top {
            let row: Option<(String, Option<String>)> = stmt
                .query_row(params![id], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()
                .map_err(|e| Error::Database(e.to_string()))?;
            if let Some((text, meta)) = row {
                hits.push(MemoryHit {
                    id,
                    text,
                    metadata: meta
                        .as_deref()
                        .and_then(|s| serde_json::from_str(s).ok())
                        .unwrap_or(Value::Null),
                    score,
                });
            }
        }
        Ok(hits)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM memory_entries", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Metadata of the entry holding exactly `text`.
    pub fn metadata_for(&self, text: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock();
        let json: Option<Option<String>> = conn
            .prepare_cached("SELECT metadata_json FROM memory_entries WHERE content_hash = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![content_hash(text)], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(json
            .flatten()
            .and_then(|s| serde_json::from_str(&s).ok()))
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        if self.matrix.lock().dirty {
            self.load_matrix()?;
        }
        Ok(())
    }

    fn load_matrix(&self) -> Result<()> {
        let rows: Vec<(i64, Vec<u8>, f64, f64)> = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare_cached("SELECT id, embedding, scale, offset_val FROM memory_entries ORDER BY id")
                .map_err(|e| Error::Database(e.to_string()))?;
            let mapped = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
                .map_err(|e| Error::Database(e.to_string()))?;
            mapped
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Database(e.to_string()))?
        };

        let mut ids = Vec::with_capacity(rows.len());
        let mut matrix = Array2::<f32>::zeros((0, self.dim));
        for (id, bytes, scale, offset) in rows {
            if bytes.len() != self.dim {
                debug!("Skipping memory entry {} with {} dims", id, bytes.len());
                continue;
            }
            let v = Quantized {
                bytes,
                scale: scale as f32,
                offset: offset as f32,
            }
            .restore();
            let norm = v.dot(&v).sqrt();
            let v = if norm > 1e-9 { v / norm } else { v };
            matrix
                .push(Axis(0), v.view())
                .map_err(|e| Error::Internal(e.to_string()))?;
            ids.push(id);
        }

        let mut mat = self.matrix.lock();
        debug!("Loaded {} embeddings into memory matrix", ids.len());
        mat.rows = matrix;
        mat.ids = ids;
        mat.dirty = false;
        Ok(())
    }
}

/// Hex SHA-256 of the text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Shallow merge of `updates` into the stored JSON object.
fn merge_metadata(existing: Option<&str>, updates: &Value) -> Value {
    let mut merged: Map<String, Value> = existing
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();
    if let Value::Object(map) = updates {
        for (k, v) in map {
            merged.insert(k.clone(), v.clone());
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn store(dim: usize) -> (MemoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path(), dim).unwrap();
        (store, dir)
    }

    #[test]
    fn test_upsert_dedups_and_merges() {
        let (store, _dir) = store(3);
        let v = array![1.0, 0.0, 0.0];
        let first = store.upsert("same text", &json!({"source": "dataset", "row_index": 2}), &v).unwrap();
        let second = store.upsert("same text", &json!({"source": "agent_support", "query": "q"}), &v).unwrap();
        assert!(matches!(first, Upsert::Inserted(_)));
        assert_eq!(second, Upsert::Merged(first.id()));
        assert_eq!(store.count().unwrap(), 1);

        let meta = store.metadata_for("same text").unwrap().unwrap();
        assert_eq!(meta, json!({"source": "agent_support", "row_index": 2, "query": "q"}));
    }

    #[test]
    fn test_search_ranks_by_cosine() {
        let (store, _dir) = store(3);
        store.upsert("x axis", &json!({"row_index": 0}), &array![1.0, 0.0, 0.0]).unwrap();
        store.upsert("y axis", &json!({}), &array![0.0, 1.0, 0.0]).unwrap();
        store.upsert("mostly x", &json!({}), &array![0.9, 0.1, 0.0]).unwrap();

        let hits = store.search(&array![1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "x axis");
        assert_eq!(hits[0].row_index(), Some(0));
        assert_eq!(hits[1].text, "mostly x");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_sees_new_entries() {
        let (store, _dir) = store(2);
        assert!(store.search(&array![1.0, 0.0], 5).unwrap().is_empty());
        store.upsert("late", &json!({}), &array![0.0, 1.0]).unwrap();
        assert_eq!(store.search(&array![0.0, 1.0], 5).unwrap().len(), 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let (store, _dir) = store(3);
        let err = store.upsert("t", &json!({}), &array![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(store.search(&array![1.0], 1).is_err());
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = MemoryStore::open(dir.path(), 2).unwrap();
            store.upsert("kept", &json!({}), &array![0.6, 0.8]).unwrap();
        }
        let store = MemoryStore::open(dir.path(), 2).unwrap();
        let hits = store.search(&array![0.6, 0.8], 1).unwrap();
        assert_eq!(hits[0].text, "kept");
        assert!((hits[0].score - 1.0).abs() < 0.02);
    }
}

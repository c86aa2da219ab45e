//! Best-effort persistence used by the agent: the vector memory and the run
//! log sink. Nothing here returns an error to the agent's answer path.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use textlens_core::Result;
use textlens_infer::EmbedderBackend;
use textlens_resolve::Candidate;
use textlens_store::{MemoryStore, RunLog, Upsert};
use tracing::{debug, warn};

/// Embedding store paired with the embedder that feeds it.
pub struct VectorMemory {
    store: MemoryStore,
    embedder: Arc<dyn EmbedderBackend>,
}

/// Counts from a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub merged: usize,
    /// Texts with nothing to embed, or whose write failed.
    pub skipped: usize,
}

impl UpsertStats {
    pub fn written(&self) -> usize {
        self.inserted + self.merged
    }
}

impl VectorMemory {
    /// Open the memory database under `dir` sized for `embedder`.
    pub fn open(dir: impl AsRef<Path>, embedder: Arc<dyn EmbedderBackend>) -> Result<Self> {
        let store = MemoryStore::open(dir, embedder.dimension())?;
        Ok(Self { store, embedder })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Up to `k` stored texts closest to `query`. Any failure yields an
    /// empty list.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<Candidate> {
        let Some(embedding) = self.embedder.embed(query) else {
            debug!("Nothing to embed for memory lookup");
            return Vec::new();
        };
        match self.store.search(&embedding, k) {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| {
                    let row = hit.row_index();
                    Candidate::from_memory(hit.text, row, hit.score)
                })
                .collect(),
            Err(e) => {
                warn!("Memory retrieval failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Write each `(text, metadata)` pair. Failures are logged and counted
    /// as skipped.
    pub fn upsert_texts<'a, I>(&self, entries: I) -> UpsertStats
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut stats = UpsertStats::default();
        for (text, metadata) in entries {
            let Some(embedding) = self.embedder.embed(text) else {
                stats.skipped += 1;
                continue;
            };
            match self.store.upsert(text, &metadata, &embedding) {
                Ok(Upsert::Inserted(_)) => stats.inserted += 1,
                Ok(Upsert::Merged(_)) => stats.merged += 1,
                Err(e) => {
                    warn!("Memory upsert failed: {}", e);
                    stats.skipped += 1;
                }
            }
        }
        debug!(
            "Memory upsert: {} inserted, {} merged, {} skipped",
            stats.inserted, stats.merged, stats.skipped
        );
        stats
    }
}

/// Destination for completed agent runs.
pub trait RunSink: Send + Sync {
    /// Create whatever storage the sink needs.
    fn ensure_ready(&self) -> Result<()>;

    fn record_run(&self, query: &str, answer: &str, support: &Value) -> Result<()>;

    /// Short description for logs and CLI output.
    fn describe(&self) -> String;
}

impl RunSink for RunLog {
    fn ensure_ready(&self) -> Result<()> {
        self.ensure_table()
    }

    fn record_run(&self, query: &str, answer: &str, support: &Value) -> Result<()> {
        self.ensure_table()?;
        let record = self.log_run(query, answer, support)?;
        debug!("Logged run {}", record.run_id);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.table(), self.db_path().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use textlens_infer::{HashEmbedder, NoopEmbedder};
    use textlens_resolve::CandidateSource;

    fn memory(dir: &Path) -> VectorMemory {
        VectorMemory::open(dir, Arc::new(HashEmbedder::new(64))).unwrap()
    }

    #[test]
    fn test_upsert_then_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        let stats = mem.upsert_texts([
            ("battery drains overnight", json!({"source": "dataset", "row_index": 3})),
            ("lovely packaging", json!({"source": "dataset", "row_index": 4})),
            ("battery drains overnight", json!({"source": "agent_support", "query": "battery"})),
            ("...", json!({})),
        ]);
        assert_eq!(stats, UpsertStats { inserted: 2, merged: 1, skipped: 1 });
        assert_eq!(stats.written(), 3);

        let hits = mem.retrieve("battery drains", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "battery drains overnight");
        assert_eq!(hits[0].row_index, Some(3));
        assert_eq!(hits[0].source, CandidateSource::Memory);
    }

    #[test]
    fn test_disabled_embedder_retrieves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mem = VectorMemory::open(dir.path(), Arc::new(NoopEmbedder::new(0))).unwrap();
        let stats = mem.upsert_texts([("text", json!({}))]);
        assert_eq!(stats.skipped, 1);
        assert!(mem.retrieve("text", 5).is_empty());
    }

    #[test]
    fn test_run_log_sink() {
        let dir = tempfile::tempdir().unwrap();
        let log = RunLog::open(dir.path().join("runs.db"), "agent_runs").unwrap();
        let sink: &dyn RunSink = &log;
        sink.record_run("q", "a", &json!([{"summary": "s"}])).unwrap();
        assert_eq!(log.recent(5).unwrap().len(), 1);
        assert!(sink.describe().starts_with("agent_runs ("));
    }
}

//! End-to-end pipeline and agent runs against fake annotators and models.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use textlens_annotate::{Annotator, Entity, Sentiment};
use textlens_core::{Error, Outcome, Record, Result, Settings, SummaryStrategy};
use textlens_generate::{GenerationRequest, Generator};
use textlens_infer::HashEmbedder;
use textlens_runtime::{AgentMode, Orchestrator, RunSink, VectorMemory};
use textlens_store::RunLog;

/// Tags every text as one entity; sentiment fails for texts mentioning "late".
struct FakeAnnotator;

#[async_trait]
impl Annotator for FakeAnnotator {
    async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let first = text.split_whitespace().next().unwrap_or_default();
        Ok(vec![Entity::new(first, "OTHER", 1.0)])
    }

    async fn sentiment(&self, text: &str) -> Result<Sentiment> {
        if text.contains("late") {
            Err(Error::Annotation("quota exceeded".into()))
        } else {
            Ok(Sentiment::new(0.5, 0.5))
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeGenerator {
    reply: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    fn new(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(String::from),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("model offline".into()))
    }

    fn name(&self) -> String {
        "fake-model".into()
    }
}

const CSV: &str = "id,original_text\n\
1,The battery drains fast. The battery gets hot.\n\
2,\n\
3,Delivery was late and the box was damaged.\n\
4,\"Great screen, terrible battery.\"\n";

fn settings(dir: &Path) -> Settings {
    let dataset = dir.join("reviews.csv");
    std::fs::write(&dataset, CSV).unwrap();
    let mut settings = Settings::default();
    settings.dataset_path = dataset.to_string_lossy().into_owned();
    settings.output_dir = dir.join("outputs");
    settings.summary_strategy = SummaryStrategy::Extractive;
    settings
}

fn records() -> Vec<Record> {
    vec![
        Record::new("The battery drains fast. The battery gets hot.", 0),
        Record::new("Delivery was late and the box was damaged.", 2),
        Record::new("Great screen, terrible battery.", 3),
    ]
}

#[tokio::test]
async fn pipeline_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(settings(dir.path()), Arc::new(FakeAnnotator), None);

    let report = orch.pipeline(None, None).await.unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(report.failed_annotations, 1);

    let mut reader = csv::Reader::from_path(&report.results_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "0");
    assert_eq!(&rows[1][0], "2");
    assert_eq!(&rows[1][3], r#"{"error":"Annotation error: quota exceeded"}"#);
    assert_eq!(&rows[2][1], "Great screen, terrible battery.");
    for row in &rows {
        assert!(row[4].split_whitespace().count() <= 10);
    }

    let eda = std::fs::read_to_string(&report.eda_path).unwrap();
    assert!(eda.starts_with("Rows: 3\n"));
    assert!(eda.contains("Top 5 samples:"));

    let log = std::fs::read_to_string(&report.log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert!(lines[0].starts_with("Starting run; dataset="));
    assert_eq!(lines[1], "Completed. Wrote 3 rows.");
}

#[tokio::test]
async fn pipeline_limit_and_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(settings(dir.path()), Arc::new(FakeAnnotator), None);

    let report = orch.pipeline(Some(1), None).await.unwrap();
    assert_eq!(report.rows, 1);

    let err = orch.pipeline(None, Some("body")).await.unwrap_err();
    assert!(matches!(err, Error::Dataset(_)));

    // The journal keeps both runs; only the first completed.
    let log = std::fs::read_to_string(&report.log_path).unwrap();
    assert_eq!(log.matches("Starting run").count(), 2);
    assert_eq!(log.matches("Completed.").count(), 1);
}

#[tokio::test]
async fn graph_agent_uses_model_for_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let model = FakeGenerator::new(Some("  Batteries drain and overheat.  "));
    let orch = Orchestrator::new(
        settings(dir.path()),
        Arc::new(FakeAnnotator),
        Some(model.clone() as Arc<dyn Generator>),
    );

    let answer = orch.ask_records(&records(), "battery", AgentMode::Graph).await;
    assert_eq!(answer.answer, "Batteries drain and overheat.");
    assert_eq!(answer.support.len(), 3);
    assert_eq!(answer.support[0].row_index, Some(0));
    assert!(matches!(answer.support[1].entities, Outcome::Done(_)));

    // Extractive strategy: the only model call is the synthesis.
    let requests = model.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].role, "system");
    assert_eq!(
        requests[0].messages[0].content,
        "You are a helpful analyst. Provide a concise, faithful answer."
    );
    assert!(requests[0].messages[1]
        .content
        .starts_with("Question: battery\nContext summaries: "));
    assert!(requests[0].messages[1]
        .content
        .ends_with("\nAnswer succinctly in 3-5 sentences."));
}

#[tokio::test]
async fn graph_agent_falls_back_when_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let failing = FakeGenerator::new(None);
    let with_model = Orchestrator::new(
        settings(dir.path()),
        Arc::new(FakeAnnotator),
        Some(failing as Arc<dyn Generator>),
    );
    let without_model = Orchestrator::new(settings(dir.path()), Arc::new(FakeAnnotator), None);

    let a = with_model.ask_records(&records(), "battery", AgentMode::Graph).await;
    let b = without_model.ask_records(&records(), "battery", AgentMode::Simple).await;
    assert_eq!(a.answer, b.answer);
    assert!(!a.answer.is_empty());
    assert!(a.answer.split_whitespace().count() <= with_model.settings().answer_max_words);
}

#[tokio::test]
async fn graph_agent_blends_memory_and_persists_runs() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let memory = VectorMemory::open(dir.path().join("memory"), Arc::new(HashEmbedder::new(128))).unwrap();
    let log = Arc::new(RunLog::open(dir.path().join("runs.db"), "agent_runs").unwrap());

    let orch = Orchestrator::new(settings, Arc::new(FakeAnnotator), None)
        .with_memory(memory)
        .with_run_sink(log.clone() as Arc<dyn RunSink>);

    let report = orch.setup_memory(false, false).await.unwrap();
    assert_eq!(report.indexed, Some(3));
    assert!(report.run_log.unwrap().starts_with("agent_runs"));

    let memory = orch.memory().unwrap();
    memory.upsert_texts([(
        "Charger stopped working after a week.",
        json!({"source": "manual"}),
    )]);

    // No keyword hit for "charger", so the memory supplies the support.
    let answer = orch.ask_records(&records(), "charger", AgentMode::Graph).await;
    assert!(answer
        .support
        .iter()
        .any(|a| a.text == "Charger stopped working after a week."));
    assert!(answer.support.len() <= 5);
    let texts: Vec<&str> = answer.support.iter().map(|a| a.text.as_str()).collect();
    let mut unique = texts.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), texts.len());

    let meta = memory
        .store()
        .metadata_for("Charger stopped working after a week.")
        .unwrap()
        .unwrap();
    assert_eq!(meta, json!({"source": "agent_support", "query": "charger"}));

    let runs = log.recent(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].query, "charger");
    assert_eq!(runs[0].answer, answer.answer);
    let support: serde_json::Value = serde_json::from_str(&runs[0].support).unwrap();
    assert_eq!(support.as_array().unwrap().len(), answer.support.len());
}

#[tokio::test]
async fn simple_agent_does_not_persist() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(RunLog::open(dir.path().join("runs.db"), "agent_runs").unwrap());
    log.ensure_table().unwrap();
    let orch = Orchestrator::new(settings(dir.path()), Arc::new(FakeAnnotator), None)
        .with_run_sink(log.clone() as Arc<dyn RunSink>);

    let answer = orch.ask("battery", AgentMode::Simple, None).await.unwrap();
    assert_eq!(answer.support.len(), 3);
    assert!(log.recent(10).unwrap().is_empty());
}

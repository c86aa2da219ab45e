//! Orchestrator: runs the batch pipeline, the query agent and memory setup.
//!
//! Everything is strictly sequential: one record at a time, one external
//! call at a time. Annotation failures become [`Outcome::Failed`] markers in
//! the output, summaries always fall back to the extractive summarizer, and
//! memory or run-log failures are logged and dropped.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use textlens_annotate::{create_annotator, Annotator};
use textlens_core::{Error, Outcome, Record, Result, Settings};
use textlens_generate::{GenerationRequest, Generator, GeneratorConfig, LlmGenerator, Summarizer};
use textlens_ingest::{eda_summary, load_dataset};
use textlens_resolve::{blend_candidates, Candidate, KeywordRetriever};
use tracing::{debug, info, warn};

use crate::memory::{RunSink, VectorMemory};
use crate::output::{self, OutputPaths};
use crate::types::*;

/// Rows retrieved per query.
pub const TOP_K: usize = 5;
/// Memory hits blended into the graph agent's candidate pool.
pub const MEMORY_K: usize = 5;

const SYNTHESIS_SYSTEM_PROMPT: &str =
    "You are a helpful analyst. Provide a concise, faithful answer.";

pub struct Orchestrator {
    settings: Settings,
    annotator: Arc<dyn Annotator>,
    generator: Option<Arc<dyn Generator>>,
    summarizer: Summarizer,
    memory: Option<VectorMemory>,
    run_sink: Option<Arc<dyn RunSink>>,
}

impl Orchestrator {
    /// Wire explicit capabilities. The summarizer uses `generator` according
    /// to the configured summary strategy.
    pub fn new(
        settings: Settings,
        annotator: Arc<dyn Annotator>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Self {
        let summarizer = Summarizer::new(settings.summary_strategy, generator.clone());
        info!(
            "Orchestrator initialized: annotator={}, generator={}, generative_summaries={}",
            annotator.name(),
            generator.as_ref().map(|g| g.name()).unwrap_or_else(|| "none".into()),
            summarizer.is_generative()
        );
        Self {
            settings,
            annotator,
            generator,
            summarizer,
            memory: None,
            run_sink: None,
        }
    }

    /// Resolve the annotator and model provider from settings.
    pub fn from_settings(settings: Settings) -> Self {
        let annotator = create_annotator(&settings);
        let generator = LlmGenerator::from_config(&GeneratorConfig::from_settings(&settings.llm))
            .map(|g| Arc::new(g) as Arc<dyn Generator>);
        Self::new(settings, annotator, generator)
    }

    pub fn with_memory(mut self, memory: VectorMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_run_sink(mut self, sink: Arc<dyn RunSink>) -> Self {
        self.run_sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn memory(&self) -> Option<&VectorMemory> {
        self.memory.as_ref()
    }

    /// Load and clean the configured dataset.
    pub async fn load_records(&self, text_col: Option<&str>) -> Result<Vec<Record>> {
        let text_col = text_col.unwrap_or(&self.settings.text_col);
        load_dataset(
            &self.settings.dataset_path,
            text_col,
            self.settings.gcs_access_token.as_deref(),
        )
        .await
    }

    /// Annotate every record of the dataset and write the output files.
    pub async fn pipeline(&self, limit: Option<usize>, text_col: Option<&str>) -> Result<PipelineReport> {
        let paths = OutputPaths::new(&self.settings.output_dir);
        paths.ensure_dir()?;
        output::append_journal(
            &paths.log,
            &format!("Starting run; dataset={}", self.settings.dataset_path),
        )?;

        let mut records = self.load_records(text_col).await?;
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        output::write_eda(&paths.eda, &eda_summary(&records))?;
        info!("Annotating {} records", records.len());

        let bar = progress_bar(records.len());
        let mut analyses = Vec::with_capacity(records.len());
        for record in &records {
            let analysis = self
                .analyze(&record.text, Some(record.row_index), None)
                .await;
            analyses.push(analysis);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let failed_annotations = analyses
            .iter()
            .filter(|a| a.entities.is_failed() || a.sentiment.is_failed())
            .count();
        if failed_annotations > 0 {
            warn!("{} rows carry annotation errors", failed_annotations);
        }

        output::write_results(&paths.results, &analyses)?;
        output::append_journal(&paths.log, &format!("Completed. Wrote {} rows.", analyses.len()))?;
        info!("Wrote {} rows to {}", analyses.len(), paths.results.display());

        Ok(PipelineReport {
            rows: analyses.len(),
            failed_annotations,
            results_path: paths.results,
            eda_path: paths.eda,
            log_path: paths.log,
        })
    }

    /// Answer `query` over the configured dataset.
    pub async fn ask(&self, query: &str, mode: AgentMode, text_col: Option<&str>) -> Result<AgentAnswer> {
        let records = self.load_records(text_col).await?;
        Ok(self.ask_records(&records, query, mode).await)
    }

    /// Answer `query` over already loaded records.
    pub async fn ask_records(&self, records: &[Record], query: &str, mode: AgentMode) -> AgentAnswer {
        info!("Agent ({}) answering: {}", mode, query);
        match mode {
            AgentMode::Simple => self.run_simple(records, query).await,
            AgentMode::Graph => self.run_graph(records, query).await,
        }
    }

    async fn run_simple(&self, records: &[Record], query: &str) -> AgentAnswer {
        let mut analyses = Vec::new();
        for scored in KeywordRetriever::retrieve(records, query, TOP_K) {
            let row = scored.row_index();
            analyses.push(self.analyze(scored.text(), Some(row), Some(query)).await);
        }
        let answer = self.summarize_answer(query, &join_summaries(&analyses)).await;
        AgentAnswer {
            query: query.to_string(),
            answer,
            support: analyses,
        }
    }

    async fn run_graph(&self, records: &[Record], query: &str) -> AgentAnswer {
        let mut state = AgentState::new(query);
        for stage in AgentStage::ORDER {
            debug!("Agent stage {:?}", stage);
            match stage {
                AgentStage::Retrieve => self.retrieve_stage(records, &mut state),
                AgentStage::Analyze => self.analyze_stage(&mut state).await,
                AgentStage::Synthesize => self.synthesize_stage(&mut state).await,
            }
        }
        let answer = state.into_answer();
        self.persist(&answer);
        answer
    }

    fn retrieve_stage(&self, records: &[Record], state: &mut AgentState) {
        let keyword = KeywordRetriever::retrieve(records, &state.query, TOP_K);
        state.candidates = match &self.memory {
            Some(memory) => {
                let hits = memory.retrieve(&state.query, MEMORY_K);
                debug!("Blending {} memory hits", hits.len());
                blend_candidates(keyword, hits, TOP_K)
            }
            None => keyword.into_iter().map(Candidate::from).collect(),
        };
    }

    async fn analyze_stage(&self, state: &mut AgentState) {
        let mut analyses = Vec::with_capacity(state.candidates.len());
        for candidate in &state.candidates {
            analyses.push(
                self.analyze(&candidate.text, candidate.row_index, Some(state.query.as_str()))
                    .await,
            );
        }
        state.analyses = analyses;
    }

    async fn synthesize_stage(&self, state: &mut AgentState) {
        let joined = join_summaries(&state.analyses);
        if let Some(generator) = &self.generator {
            let request = GenerationRequest::with_system(
                SYNTHESIS_SYSTEM_PROMPT,
                format!(
                    "Question: {}\nContext summaries: {}\nAnswer succinctly in 3-5 sentences.",
                    state.query, joined
                ),
            );
            match generator.generate(&request).await {
                Ok(text) if !text.trim().is_empty() => {
                    state.answer = text.trim().to_string();
                    return;
                }
                Ok(_) => debug!("{} returned an empty answer", generator.name()),
                Err(e) => warn!("Answer synthesis failed, summarizing instead: {}", e),
            }
        }
        state.answer = self.summarize_answer(&state.query, &joined).await;
    }

    /// Entities, sentiment and summary of one text.
    async fn analyze(&self, text: &str, row_index: Option<usize>, query: Option<&str>) -> Analysis {
        let entities: Outcome<_> = self.annotator.entities(text).await.into();
        let sentiment: Outcome<_> = self.annotator.sentiment(text).await.into();
        if let Some(e) = entities.error().or(sentiment.error()) {
            debug!("Annotation failed for row {:?}: {}", row_index, e);
        }
        let context = query.map(|q| format!("User query: {}", q));
        let summary = self
            .summarizer
            .summarize(text, context.as_deref(), self.settings.summary_max_words)
            .await;
        Analysis {
            text: text.to_string(),
            row_index,
            entities,
            sentiment,
            summary,
        }
    }

    async fn summarize_answer(&self, query: &str, joined: &str) -> String {
        let context = format!("Answer the user query: {}", query);
        self.summarizer
            .summarize(joined, Some(&context), self.settings.answer_max_words)
            .await
    }

    /// Upsert the support texts and log the run. Failures are logged only.
    fn persist(&self, answer: &AgentAnswer) {
        if let Some(memory) = &self.memory {
            let metadata = json!({"source": "agent_support", "query": answer.query});
            memory.upsert_texts(
                answer
                    .support
                    .iter()
                    .map(|a| (a.text.as_str(), metadata.clone())),
            );
        }
        if let Some(sink) = &self.run_sink {
            let result = serde_json::to_value(&answer.support)
                .map_err(Error::from)
                .and_then(|support| sink.record_run(&answer.query, &answer.answer, &support));
            if let Err(e) = result {
                warn!("Run logging to {} failed: {}", sink.describe(), e);
            }
        }
    }

    /// Build the vector memory from the dataset and/or ensure the run log.
    ///
    /// With neither flag set, builds the index and ensures the run log when
    /// one is attached.
    pub async fn setup_memory(&self, build_index: bool, ensure_log: bool) -> Result<MemorySetupReport> {
        let (build_index, ensure_log) = if build_index || ensure_log {
            (build_index, ensure_log)
        } else {
            (true, self.run_sink.is_some())
        };
        let mut report = MemorySetupReport::default();

        if build_index {
            let memory = self
                .memory
                .as_ref()
                .ok_or_else(|| Error::Config("vector memory is not configured".into()))?;
            let records = self.load_records(None).await?;
            let stats = memory.upsert_texts(records.iter().map(|r| {
                (
                    r.text.as_str(),
                    json!({"source": "dataset", "row_index": r.row_index}),
                )
            }));
            info!(
                "Vector memory built: {} inserted, {} merged, {} skipped",
                stats.inserted, stats.merged, stats.skipped
            );
            report.indexed = Some(stats.written());
        }

        if ensure_log {
            let sink = self
                .run_sink
                .as_ref()
                .ok_or_else(|| Error::Config("run log is not configured".into()))?;
            sink.ensure_ready()?;
            report.run_log = Some(sink.describe());
        }

        Ok(report)
    }
}

fn join_summaries(analyses: &[Analysis]) -> String {
    analyses
        .iter()
        .map(|a| a.summary.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message("annotating");
    bar
}

//! textlens: text-analytics pipeline and query agent.

use std::sync::Arc;

use clap::Parser;
use textlens_core::Settings;
use textlens_runtime::{AgentAnswer, Orchestrator, RunSink, VectorMemory};
use textlens_store::RunLog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command};

const SUPPORT_PREVIEW_CHARS: usize = 280;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    cli.apply(&mut settings);
    info!("Dataset: {}", settings.dataset_path);

    if let Some(Command::SetupMemory { index, run_log }) = cli.command {
        return setup_memory(settings, index, run_log).await;
    }

    if let Some(query) = &cli.agent {
        let memory = if settings.use_memory {
            open_memory(&settings)
        } else {
            None
        };
        let run_log = if cli.use_run_log {
            open_run_log(&settings)
        } else {
            None
        };

        let mut orch = Orchestrator::from_settings(settings);
        if let Some(memory) = memory {
            orch = orch.with_memory(memory);
        }
        if let Some(sink) = run_log {
            orch = orch.with_run_sink(sink);
        }

        let answer = orch.ask(query, cli.agent_mode, None).await?;
        print_answer(&answer);
        return Ok(());
    }

    let orch = Orchestrator::from_settings(settings);
    let report = orch.pipeline(cli.limit, None).await?;
    println!(
        "Wrote {} rows to {}",
        report.rows,
        report.results_path.display()
    );
    Ok(())
}

async fn setup_memory(settings: Settings, index: bool, run_log: bool) -> anyhow::Result<()> {
    let both = !index && !run_log;

    let memory = if index || both {
        let embedder = textlens_infer::create_embedder(settings.embedding_dim);
        Some(
            VectorMemory::open(&settings.memory_dir, embedder)
                .map_err(|e| anyhow::anyhow!("Failed to open vector memory: {}", e))?,
        )
    } else {
        None
    };
    let sink = if run_log || both {
        open_run_log(&settings)
    } else {
        None
    };

    let mut orch = Orchestrator::from_settings(settings);
    if let Some(memory) = memory {
        orch = orch.with_memory(memory);
    }
    if let Some(sink) = sink {
        orch = orch.with_run_sink(sink);
    }

    let report = orch.setup_memory(index, run_log).await?;
    if let (Some(n), Some(memory)) = (report.indexed, orch.memory()) {
        println!(
            "[OK] Vector memory built at {} ({} texts)",
            memory.store().db_path().display(),
            n
        );
    }
    if let Some(table) = report.run_log {
        println!("[OK] Run log table ensured: {}", table);
    }
    Ok(())
}

fn open_memory(settings: &Settings) -> Option<VectorMemory> {
    let embedder = textlens_infer::create_embedder(settings.embedding_dim);
    match VectorMemory::open(&settings.memory_dir, embedder) {
        Ok(memory) => Some(memory),
        Err(e) => {
            warn!("Vector memory unavailable: {}", e);
            None
        }
    }
}

fn open_run_log(settings: &Settings) -> Option<Arc<dyn RunSink>> {
    match RunLog::open(&settings.run_log_db, &settings.run_log_table) {
        Ok(log) => Some(Arc::new(log) as Arc<dyn RunSink>),
        Err(e) => {
            warn!("Run log unavailable: {}", e);
            None
        }
    }
}

fn print_answer(answer: &AgentAnswer) {
    println!("\n=== Agent Answer ===\n");
    println!("{}", answer.answer);
    println!("\n--- Support (top docs) ---");
    for (i, item) in answer.support.iter().enumerate() {
        let preview: String = item.summary.chars().take(SUPPORT_PREVIEW_CHARS).collect();
        println!("\n[{}] {}", i + 1, preview);
    }
}

//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use textlens_core::Settings;
use textlens_runtime::AgentMode;

#[derive(Debug, Parser)]
#[command(
    name = "textlens",
    version,
    about = "Annotate a text dataset with entities, sentiment and summaries, or ask the agent a question"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Process only the first N rows
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Override the text column name
    #[arg(long, value_name = "COL")]
    pub text_col: Option<String>,

    /// Ask the agent a question instead of running the pipeline
    #[arg(long, value_name = "QUERY")]
    pub agent: Option<String>,

    /// Agent implementation (simple or graph)
    #[arg(long, value_name = "MODE", default_value_t = AgentMode::Graph)]
    pub agent_mode: AgentMode,

    /// Blend vector-memory hits into retrieval and store support texts
    #[arg(long, default_value_t = false)]
    pub use_memory: bool,

    /// Directory of the vector memory database
    #[arg(long, value_name = "DIR")]
    pub memory_dir: Option<PathBuf>,

    /// Log agent runs to the SQLite run log
    #[arg(long, default_value_t = false)]
    pub use_run_log: bool,

    /// Run log database file
    #[arg(long, value_name = "PATH")]
    pub run_log_db: Option<PathBuf>,

    /// Run log table name
    #[arg(long, value_name = "NAME")]
    pub run_log_table: Option<String>,

    /// Directory for results.csv, eda.txt and log.txt
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the vector memory from the dataset and/or create the run log
    /// table. With neither flag, does both.
    SetupMemory {
        /// Index the dataset into the vector memory
        #[arg(long, default_value_t = false)]
        index: bool,

        /// Create the run log table
        #[arg(long, default_value_t = false)]
        run_log: bool,
    },
}

impl Cli {
    /// Flags given on the command line win over the environment.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(col) = &self.text_col {
            settings.text_col = col.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(dir) = &self.memory_dir {
            settings.memory_dir = dir.clone();
        }
        if let Some(db) = &self.run_log_db {
            settings.run_log_db = db.clone();
        }
        if let Some(table) = &self.run_log_table {
            settings.run_log_table = table.clone();
        }
        settings.use_memory |= self.use_memory;
    }
}

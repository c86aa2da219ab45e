//! Pipeline output files: `results.csv`, `eda.txt` and the `log.txt` journal.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use textlens_core::{Error, Result};

use crate::types::Analysis;

pub const RESULTS_FILE: &str = "results.csv";
pub const EDA_FILE: &str = "eda.txt";
pub const LOG_FILE: &str = "log.txt";

const RESULTS_HEADER: [&str; 5] = ["row_index", "original_text", "entities", "sentiment", "summary"];

/// Locations of the files under one output directory.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub results: PathBuf,
    pub eda: PathBuf,
    pub log: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            results: dir.join(RESULTS_FILE),
            eda: dir.join(EDA_FILE),
            log: dir.join(LOG_FILE),
            dir,
        }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::Storage(e.to_string()))
    }
}

/// Append one line to the journal.
pub fn append_journal(path: &Path, message: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", message)?;
    Ok(())
}

pub fn write_eda(path: &Path, summary: &str) -> Result<()> {
    fs::write(path, summary)?;
    Ok(())
}

/// One CSV row per analysis. Annotation cells hold JSON.
pub fn write_results(path: &Path, analyses: &[Analysis]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| Error::Storage(e.to_string()))?;
    writer
        .write_record(RESULTS_HEADER)
        .map_err(|e| Error::Storage(e.to_string()))?;

    for analysis in analyses {
        let row_index = analysis
            .row_index
            .map(|i| i.to_string())
            .unwrap_or_default();
        let entities = serde_json::to_string(&analysis.entities)?;
        let sentiment = serde_json::to_string(&analysis.sentiment)?;
        writer
            .write_record([
                row_index.as_str(),
                analysis.text.as_str(),
                entities.as_str(),
                sentiment.as_str(),
                analysis.summary.as_str(),
            ])
            .map_err(|e| Error::Storage(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

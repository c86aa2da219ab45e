//! textlens ingest: dataset loading and cleaning, EDA, and the offline text
//! heuristics (extractive summarizer, entity and sentiment extraction).

pub mod dataset;
pub mod eda;
pub mod extract;

pub use dataset::{basic_clean, decode_with_fallbacks, load_dataset, parse_csv};
pub use eda::eda_summary;
pub use extract::summary::{summarize, truncate_words};

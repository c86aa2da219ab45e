//! textlens core: shared records, error type, settings and the tagged
//! outcome used for every external call.

pub mod config;
pub mod error;
pub mod outcome;
pub mod record;

pub use config::{AnnotatorChoice, LlmSettings, Settings, SummaryStrategy};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use record::{Record, ScoredRecord};

//! Runtime orchestrator: the batch pipeline, the query agent and the
//! memory setup verb, plus the persistence glue they share.

pub mod memory;
pub mod orchestrator;
pub mod output;
pub mod types;

pub use memory::{RunSink, UpsertStats, VectorMemory};
pub use orchestrator::Orchestrator;
pub use types::*;

//! Retrieval: ranks dataset records against a query and blends the ranked
//! records with vector-memory hits into one candidate pool.

pub mod blend;
pub mod keyword;
pub mod types;

pub use blend::{blend_candidates, dedup_by_text};
pub use keyword::KeywordRetriever;
pub use types::*;

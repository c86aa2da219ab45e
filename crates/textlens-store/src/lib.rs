//! textlens store: SQLite-backed vector memory (uint8-quantized embeddings,
//! cosine search) and the durable agent run log.

pub mod memory;
pub mod quantize;
pub mod runlog;
pub mod schema;
pub mod types;

pub use memory::MemoryStore;
pub use runlog::RunLog;
pub use types::*;

use std::path::Path;

use rusqlite::Connection;
use textlens_core::{Error, Result};

/// Open a connection with the pragmas every store uses.
pub(crate) fn open_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
    }
    let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
    .map_err(|e| Error::Database(e.to_string()))?;
    Ok(conn)
}

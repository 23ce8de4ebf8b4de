//! Vector index backed by an in-memory SQLite database with sqlite-vec.
//!
//! The index lives for the lifetime of the process and is rebuilt on every
//! start; nothing is written to disk.
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::sync::Once;
use thiserror::Error;
use tracing::info;

pub mod models;
pub mod search;
pub mod sections;

/// Errors raised by the vector index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

fn schema_sql(dimensions: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS sections (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS vec_sections USING vec0(
    embedding FLOAT[{dimensions}]
);
"#
    )
}

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection holding the section table and its vector companion.
pub struct Db {
    pub(crate) conn: Connection,
    dimensions: usize,
}

impl Db {
    /// Open a fresh in-memory index for embeddings of `dimensions` floats.
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(IndexError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;

        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {vec_version}");

        conn.execute_batch(&schema_sql(dimensions))?;
        info!("Vector index initialized ({dimensions} dimensions)");

        Ok(Self { conn, dimensions })
    }

    /// Dimensionality every stored embedding must have.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

/// Helper to serialize a float32 vector into bytes for vec0 virtual table
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

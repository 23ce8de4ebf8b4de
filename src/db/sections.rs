use super::models::{EntryMetadata, NewEntry};
use super::{Db, Result, serialize_vector};
use rusqlite::{Transaction, params};

/// Upsert one entry; a repeated id replaces text, metadata and embedding.
fn upsert(tx: &Transaction<'_>, entry: &NewEntry<'_>) -> Result<()> {
    let metadata = serde_json::to_string(&entry.metadata)?;

    let seq: i64 = tx.query_row(
        r#"
        INSERT INTO sections (id, content, metadata)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            content = excluded.content,
            metadata = excluded.metadata
        RETURNING seq
        "#,
        params![entry.id, entry.text, metadata],
        |row| row.get(0),
    )?;

    // vec0 has no upsert; replace the vector row explicitly
    tx.execute("DELETE FROM vec_sections WHERE rowid = ?", params![seq])?;
    tx.execute(
        "INSERT INTO vec_sections (rowid, embedding) VALUES (?, ?)",
        params![seq, serialize_vector(entry.embedding)],
    )?;

    Ok(())
}

impl Db {
    /// Insert a single entry.
    ///
    /// Ids are expected to be unique. Adding an id that already exists
    /// overwrites the earlier entry in place (it keeps its original
    /// insertion position).
    pub fn add(
        &mut self,
        id: &str,
        text: &str,
        embedding: &[f32],
        metadata: EntryMetadata,
    ) -> Result<()> {
        self.add_batch(&[NewEntry {
            id,
            text,
            embedding,
            metadata,
        }])
    }

    /// Insert several entries in one transaction; all or nothing.
    pub fn add_batch(&mut self, entries: &[NewEntry<'_>]) -> Result<()> {
        for entry in entries {
            self.check_dimensions(entry.embedding)?;
        }

        let tx = self.conn.transaction()?;
        for entry in entries {
            upsert(&tx, entry)?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Number of entries currently stored.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*) FROM sections", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// All entry ids in insertion order.
    pub fn ids(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT id FROM sections ORDER BY seq")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

use super::models::EntryMetadata;
use super::{Db, Result, serialize_vector};
use rusqlite::params;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    /// Cosine distance in `[0, 2]`; lower is nearer.
    pub distance: f64,
    /// `1 - distance / 2`, in `[0, 1]`.
    pub similarity: f64,
    pub metadata: EntryMetadata,
}

fn map_search_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, f64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

impl Db {
    /// Nearest entries to `query_vector` by cosine distance, nearest first.
    ///
    /// Returns at most `top_k` results; fewer if the index is smaller, none
    /// if it is empty. Equal distances keep insertion order.
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.check_dimensions(query_vector)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                s.id,
                s.content,
                s.metadata,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM vec_sections v
            JOIN sections s ON v.rowid = s.seq
            ORDER BY distance ASC, s.seq ASC
            LIMIT ?
            "#,
        )?;
        let rows = stmt.query_map(
            params![serialize_vector(query_vector), top_k as i64],
            map_search_row,
        )?;

        let mut results = Vec::new();
        for row in rows {
            let (id, text, metadata, distance) = row?;
            results.push(SearchResult {
                id,
                text,
                distance,
                similarity: 1.0 - (distance / 2.0),
                metadata: serde_json::from_str(&metadata)?,
            });
        }

        Ok(results)
    }

    /// Texts of the `k` nearest entries, nearest first.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>> {
        Ok(self
            .search(embedding, k)?
            .into_iter()
            .map(|r| r.text)
            .collect())
    }
}

use crate::context::{EmbedCallError, RagContext};
use crate::db::IndexError;
use crate::db::models::{EntryMetadata, NewEntry, entry_id};
use crate::indexer::pdf::{PdfDocument, extract_text};
use crate::indexer::sections::{Section, split_and_clean};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IndexBuildError {
    #[error("failed to embed sections: {0}")]
    Embedding(#[from] EmbedCallError),

    #[error("failed to store sections: {0}")]
    Index(#[from] IndexError),

    #[error("embedder returned {vectors} vectors for {sections} sections")]
    CountMismatch { sections: usize, vectors: usize },
}

/// Read the PDF at `path` and split it into cleaned sections.
///
/// An unreadable document is not fatal: the error is logged and an empty
/// list comes back, so the service can still start.
pub fn load_sections(path: &Path, skip_pages: usize) -> Vec<Section> {
    let document = match PdfDocument::open(path) {
        Ok(document) => document,
        Err(e) => {
            warn!("Error processing PDF: {e}");
            return Vec::new();
        }
    };

    let raw = extract_text(&document, skip_pages);
    let sections = split_and_clean(&raw);
    info!(
        "Extracted {} section(s) from {} (skipped {skip_pages} page(s))",
        sections.len(),
        path.display()
    );
    sections
}

/// Sections embedded per bounded embedding call.
pub const EMBED_CHUNK_SIZE: usize = 16;

/// Embed `sections` and store them as `paragraph_<index>` entries.
///
/// Embedding runs in chunks of [`EMBED_CHUNK_SIZE`], each under the
/// context's timeout. Returns the number of entries written.
pub async fn build_index(ctx: &RagContext, sections: &[Section]) -> Result<usize, IndexBuildError> {
    if sections.is_empty() {
        warn!("No sections to index; queries will find nothing");
        return Ok(0);
    }

    let mut vectors = Vec::with_capacity(sections.len());
    for chunk in sections.chunks(EMBED_CHUNK_SIZE) {
        let texts: Vec<String> = chunk.iter().map(|s| s.cleaned_text.clone()).collect();
        vectors.extend(ctx.embed_batch(texts).await?);
    }
    if vectors.len() != sections.len() {
        return Err(IndexBuildError::CountMismatch {
            sections: sections.len(),
            vectors: vectors.len(),
        });
    }

    let ids: Vec<String> = sections.iter().map(|s| entry_id(s.index)).collect();
    let entries: Vec<NewEntry<'_>> = sections
        .iter()
        .zip(&ids)
        .zip(&vectors)
        .map(|((section, id), vector)| NewEntry {
            id,
            text: &section.cleaned_text,
            embedding: vector,
            metadata: EntryMetadata {
                paragraph_id: section.index,
            },
        })
        .collect();

    {
        let mut db = ctx.db.lock().await;
        db.add_batch(&entries)?;
    }

    info!("Indexed {} section(s)", entries.len());
    Ok(entries.len())
}

/// Render sections in the inspection dump format.
#[must_use]
pub fn render_section_dump(sections: &[Section]) -> String {
    let rule = "-".repeat(50);
    sections
        .iter()
        .map(|section| format!("Section {}:\n{}\n{rule}\n", section.index, section.cleaned_text))
        .collect()
}

/// Write the cleaned sections to `path` for manual inspection.
pub fn write_section_dump(path: &Path, sections: &[Section]) -> std::io::Result<()> {
    std::fs::write(path, render_section_dump(sections))?;
    info!("Sections saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use crate::embedder::{Embedder, EmbedderError};
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx() -> RagContext {
        RagContext::new(Arc::new(MockEmbedder::default()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_build_index_assigns_sequential_ids() {
        let ctx = ctx();
        let sections = split_and_clean(
            "Preamble.\nArticle 1\nHuman dignity\nInviolable.\nArticle 2\nRight to life\nEveryone.\n",
        );

        let written = build_index(&ctx, &sections).await.unwrap();
        assert_eq!(written, 3);

        let db = ctx.db.lock().await;
        assert_eq!(
            db.ids().unwrap(),
            vec!["paragraph_1", "paragraph_2", "paragraph_3"]
        );
    }

    #[tokio::test]
    async fn test_build_index_stores_metadata() {
        let ctx = ctx();
        let sections = split_and_clean("Article 7\nRespect for private and family life\nEveryone.\n");
        build_index(&ctx, &sections).await.unwrap();

        let query = ctx.embedder.embed(&sections[0].cleaned_text).unwrap();
        let db = ctx.db.lock().await;
        let hits = db.search(&query, 1).unwrap();
        assert_eq!(hits[0].id, "paragraph_1");
        assert_eq!(hits[0].metadata.paragraph_id, 1);
        assert_eq!(hits[0].text, sections[0].cleaned_text);
    }

    #[tokio::test]
    async fn test_build_index_empty() {
        let ctx = ctx();
        assert_eq!(build_index(&ctx, &[]).await.unwrap(), 0);
        assert_eq!(ctx.db.lock().await.count().unwrap(), 0);
    }

    /// Sleeps well past any test timeout on every call.
    struct StalledEmbedder;

    impl Embedder for StalledEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
            std::thread::sleep(Duration::from_millis(400));
            Ok(vec![1.0, 0.0])
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            texts.iter().map(|t| self.embed(t)).collect()
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_build_index_embedding_is_time_bounded() {
        let ctx = RagContext::new(Arc::new(StalledEmbedder), Duration::from_millis(50)).unwrap();
        let sections = split_and_clean("Article 1\nHuman dignity\nInviolable.\nArticle 2\nRight to life\nEveryone.\n");

        let started = std::time::Instant::now();
        let err = build_index(&ctx, &sections).await.unwrap_err();

        assert!(matches!(err, IndexBuildError::Embedding(EmbedCallError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(ctx.db.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_build_index_spans_several_chunks() {
        let ctx = ctx();
        let raw: String = (1..=EMBED_CHUNK_SIZE * 2 + 3)
            .map(|n| format!("Article {n}\nTitle {n}\nBody text of this section.\n"))
            .collect();
        let sections = split_and_clean(&raw);

        let written = build_index(&ctx, &sections).await.unwrap();
        assert_eq!(written, EMBED_CHUNK_SIZE * 2 + 3);
        assert_eq!(ctx.db.lock().await.count().unwrap(), written);
    }

    #[test]
    fn test_load_sections_unreadable_document() {
        assert!(load_sections(Path::new("/nonexistent/charter.pdf"), 4).is_empty());
    }

    #[test]
    fn test_section_dump_format() {
        let sections = split_and_clean("Article 1\nHuman dignity\nInviolable.\n");
        let dump = render_section_dump(&sections);
        assert_eq!(
            dump,
            format!("Section 1:\nArticle 1: Human dignity. Inviolable.\n{}\n", "-".repeat(50))
        );
    }

    #[test]
    fn test_write_section_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_pdf.txt");
        let sections = split_and_clean("Article 1\nA\nB.\nArticle 2\nC\nD.\n");

        write_section_dump(&path, &sections).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Section 1:\nArticle 1: A. B.\n"));
        assert!(written.contains("Section 2:\nArticle 2: C. D.\n"));
    }
}

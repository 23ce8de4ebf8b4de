/// Query-time retrieval: embed the question, look up the nearest sections.
use thiserror::Error;
use tracing::debug;

use crate::context::{EmbedCallError, RagContext};
use crate::db::IndexError;

/// Returned in place of an empty result so callers always have something to show.
pub const NO_RELEVANT_SECTIONS: &str = "No relevant sections found.";

/// Snippets handed to the answer generator by default.
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("failed to embed query: {0}")]
    Embedding(#[from] EmbedCallError),

    #[error("index query failed: {0}")]
    Index(#[from] IndexError),

    #[error("k must be at least 1")]
    ZeroK,
}

/// Up to `k` section texts nearest to `query`, nearest first.
///
/// An empty index yields `[NO_RELEVANT_SECTIONS]` instead of an empty list.
/// `k == 0` is rejected.
pub async fn retrieve(ctx: &RagContext, query: &str, k: usize) -> Result<Vec<String>, RetrievalError> {
    if k == 0 {
        return Err(RetrievalError::ZeroK);
    }
    if ctx.db.lock().await.count()? == 0 {
        debug!("Index is empty");
        return Ok(vec![NO_RELEVANT_SECTIONS.to_string()]);
    }

    let query_vector = ctx.embed(query).await?;
    let snippets = {
        let db = ctx.db.lock().await;
        db.query(&query_vector, k)?
    };
    debug!("Retrieved {} snippet(s) for query", snippets.len());
    Ok(snippets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::EntryMetadata;
    use crate::embedder::Embedder;
    use crate::embedder::mock::MockEmbedder;
    use std::sync::Arc;
    use std::time::Duration;

    const ARTICLES: &[&str] = &[
        "Article 1: Human dignity. Human dignity is inviolable.",
        "Article 2: Right to life. Everyone has the right to life.",
        "Article 14: Right to education. Everyone has the right to education.",
        "Article 18: Right to asylum. The right to asylum shall be guaranteed.",
    ];

    async fn context_with(texts: &[&str]) -> RagContext {
        let embedder = Arc::new(MockEmbedder::default());
        let ctx = RagContext::new(embedder.clone(), Duration::from_secs(5)).unwrap();
        {
            let mut db = ctx.db.lock().await;
            for (i, text) in texts.iter().enumerate() {
                db.add(
                    &format!("paragraph_{}", i + 1),
                    text,
                    &embedder.embed(text).unwrap(),
                    EntryMetadata { paragraph_id: i + 1 },
                )
                .unwrap();
            }
        }
        ctx
    }

    #[tokio::test]
    async fn test_retrieve_best_match_first() {
        let ctx = context_with(ARTICLES).await;
        let snippets = retrieve(&ctx, "asylum", DEFAULT_TOP_K).await.unwrap();

        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0], ARTICLES[3]);
    }

    #[tokio::test]
    async fn test_retrieve_bounded_by_k() {
        let ctx = context_with(ARTICLES).await;
        for k in 1..=6 {
            let snippets = retrieve(&ctx, "right", k).await.unwrap();
            assert_eq!(snippets.len(), k.min(ARTICLES.len()));
        }
    }

    #[tokio::test]
    async fn test_retrieve_empty_index_returns_sentinel() {
        let ctx = context_with(&[]).await;
        let snippets = retrieve(&ctx, "anything", DEFAULT_TOP_K).await.unwrap();
        assert_eq!(snippets, vec![NO_RELEVANT_SECTIONS]);
    }

    #[tokio::test]
    async fn test_retrieve_without_overlap_still_returns_entries() {
        let ctx = context_with(ARTICLES).await;
        let snippets = retrieve(&ctx, "zzz qqq", DEFAULT_TOP_K).await.unwrap();
        assert_eq!(snippets.len(), 3);
        assert!(!snippets.contains(&NO_RELEVANT_SECTIONS.to_string()));
    }

    #[tokio::test]
    async fn test_retrieve_zero_k_rejected() {
        let ctx = context_with(&ARTICLES[..1]).await;
        let err = retrieve(&ctx, "dignity", 0).await.unwrap_err();
        assert!(matches!(err, RetrievalError::ZeroK));

        let empty = context_with(&[]).await;
        assert!(matches!(
            retrieve(&empty, "dignity", 0).await.unwrap_err(),
            RetrievalError::ZeroK
        ));
    }
}

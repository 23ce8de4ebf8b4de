/// Shared pipeline state: the vector index and the embedder that feeds it.
///
/// Built once by the entry point and handed to indexing and retrieval; there
/// are no process-wide singletons.
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;
use tracing::warn;

use crate::db::{Db, IndexError};
use crate::embedder::{Embedder, EmbedderError};

#[derive(Error, Debug)]
pub enum EmbedCallError {
    #[error(transparent)]
    Embedder(#[from] EmbedderError),

    #[error("embedding timed out after {0:?} (retried once)")]
    Timeout(Duration),

    #[error("embedding task failed: {0}")]
    Task(String),
}

#[derive(Clone)]
pub struct RagContext {
    pub db: Arc<TokioMutex<Db>>,
    pub embedder: Arc<dyn Embedder>,
    pub embed_timeout: Duration,
}

impl RagContext {
    /// Create a context with an empty index sized for `embedder`.
    pub fn new(embedder: Arc<dyn Embedder>, embed_timeout: Duration) -> Result<Self, IndexError> {
        let db = Db::open_in_memory(embedder.dimensions())?;
        Ok(Self {
            db: Arc::new(TokioMutex::new(db)),
            embedder,
            embed_timeout,
        })
    }

    /// Embed one text off the async runtime, bounded by `embed_timeout`.
    ///
    /// A timeout is retried once before it is reported.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedCallError> {
        let text = text.to_string();
        self.with_retry(move |embedder| embedder.embed(&text)).await
    }

    /// Embed a batch of texts with the same timeout and retry as [`Self::embed`].
    ///
    /// The timeout bounds the whole batch.
    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedCallError> {
        self.with_retry(move |embedder| {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder.embed_batch(&refs)
        })
        .await
    }

    async fn with_retry<T, F>(&self, job: F) -> Result<T, EmbedCallError>
    where
        T: Send + 'static,
        F: Fn(&dyn Embedder) -> Result<T, EmbedderError> + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        match self.run_once(Arc::clone(&job)).await {
            Err(EmbedCallError::Timeout(limit)) => {
                warn!("Embedding timed out after {limit:?}, retrying once");
                self.run_once(job).await
            }
            other => other,
        }
    }

    async fn run_once<T, F>(&self, job: Arc<F>) -> Result<T, EmbedCallError>
    where
        T: Send + 'static,
        F: Fn(&dyn Embedder) -> Result<T, EmbedderError> + Send + Sync + 'static,
    {
        let embedder = Arc::clone(&self.embedder);
        let task = tokio::task::spawn_blocking(move || job(&*embedder));

        match tokio::time::timeout(self.embed_timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_err)) => Err(EmbedCallError::Task(join_err.to_string())),
            Err(_) => Err(EmbedCallError::Timeout(self.embed_timeout)),
        }
    }
}

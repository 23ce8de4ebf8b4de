/// ONNX Runtime embedder using the `ort` crate.
///
/// Runs a sentence-transformers MiniLM model, applies mean pooling over the
/// attention mask, and L2-normalizes the result.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use super::tokenizer::{SentenceTokenizer, TokenizerOutput};
use super::{Embedder, EmbedderError};

/// Texts per inference call when embedding a batch.
const BATCH_SIZE: usize = 16;

/// ONNX-backed embedder implementing the `Embedder` trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: SentenceTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    ///
    /// `dimensions` is the hidden size of the model (384 for MiniLM-L6).
    pub fn new(model_dir: &Path, dimensions: usize, max_length: usize) -> Result<Self, EmbedderError> {
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!("Initializing ONNX Runtime...");

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        let tokenizer = SentenceTokenizer::from_model_dir(model_dir, max_length)
            .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;

        info!(
            "ONNX model loaded from {} (vocab size: {}, max tokens: {})",
            model_dir.display(),
            tokenizer.vocab_size(),
            tokenizer.max_length()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }

    /// Run one forward pass over equally padded token sequences.
    fn run(&self, batch: &[TokenizerOutput]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let batch_size = batch.len();
        let seq_len = batch.first().map_or(0, TokenizerOutput::len);
        if batch_size == 0 || seq_len == 0 {
            return Ok(Vec::new());
        }

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask = Vec::with_capacity(batch_size * seq_len);
        for tokens in batch {
            if tokens.len() != seq_len {
                return Err(EmbedderError::TokenizerError(format!(
                    "ragged batch: expected {seq_len} tokens, got {}",
                    tokens.len()
                )));
            }
            input_ids.extend_from_slice(&tokens.input_ids);
            attention_mask.extend_from_slice(&tokens.attention_mask);
        }

        let shape = [batch_size, seq_len];
        let input_ids_val = Tensor::from_array((shape, input_ids))
            .map_err(|e| EmbedderError::InferenceFailed(format!("input_ids error: {e}")))?;
        let attention_mask_val = Tensor::from_array((shape, attention_mask.clone()))
            .map_err(|e| EmbedderError::InferenceFailed(format!("attention_mask error: {e}")))?;
        let token_type_ids_val = Tensor::from_array((shape, vec![0i64; batch_size * seq_len]))
            .map_err(|e| EmbedderError::InferenceFailed(format!("token_type_ids error: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_val,
                "attention_mask" => attention_mask_val,
                "token_type_ids" => token_type_ids_val,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(format!("inference failed: {e}")))?;

        // [batch_size, seq_len, hidden_size]
        let (_shape, hidden_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        let row_len = seq_len * self.dimensions;
        if hidden_data.len() != batch_size * row_len {
            return Err(EmbedderError::InferenceFailed(format!(
                "unexpected output size {} for batch {batch_size}x{seq_len}x{}",
                hidden_data.len(),
                self.dimensions
            )));
        }

        Ok(hidden_data
            .chunks(row_len)
            .zip(attention_mask.chunks(seq_len))
            .map(|(hidden, mask)| {
                l2_normalize(&mean_pooling(hidden, mask, seq_len, self.dimensions))
            })
            .collect())
    }
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;

        self.run(std::slice::from_ref(&tokens))?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("empty model output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let tokens = self
                .tokenizer
                .tokenize_batch(chunk)
                .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;
            vectors.extend(self.run(&tokens)?);
            debug!("Embedded {}/{} texts", vectors.len(), texts.len());
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Mean pooling over hidden states weighted by attention mask.
///
/// `hidden_data` is a flat array with shape `[seq_len, hidden_size]`.
fn mean_pooling(
    hidden_data: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut result = vec![0.0f32; hidden_size];
    let mut mask_sum: f32 = 0.0;

    for t in 0..seq_len {
        let mask = attention_mask[t] as f32;
        if mask == 0.0 {
            continue;
        }
        mask_sum += mask;

        let token = &hidden_data[t * hidden_size..(t + 1) * hidden_size];
        for (acc, v) in result.iter_mut().zip(token) {
            *acc += v * mask;
        }
    }

    if mask_sum > 0.0 {
        for v in &mut result {
            *v /= mask_sum;
        }
    }

    result
}

/// L2-normalize a vector, returning the normalized copy.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq == 0.0 {
        return vec.to_vec();
    }

    let inv_norm = 1.0 / norm_sq.sqrt();
    vec.iter().map(|v| v * inv_norm).collect()
}

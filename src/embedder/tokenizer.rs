/// WordPiece tokenizer wrapper around the HuggingFace `tokenizers` crate.
///
/// Produces input IDs and attention masks for the ONNX embedder.
use std::path::Path;

use anyhow::Result;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

/// Default sequence cap used by sentence-transformers for MiniLM models.
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Wrapper around the HuggingFace tokenizer for BERT-style models.
pub struct SentenceTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

/// Output of a tokenization operation.
#[derive(Debug, Clone)]
pub struct TokenizerOutput {
    /// Token IDs (input_ids for the model).
    pub input_ids: Vec<i64>,
    /// Attention mask (1 for real tokens, 0 for padding).
    pub attention_mask: Vec<i64>,
}

impl TokenizerOutput {
    fn from_encoding(encoding: &tokenizers::Encoding) -> Self {
        Self {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
        }
    }

    /// Number of positions, padding included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

impl SentenceTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file in the model directory.
    ///
    /// Inputs longer than `max_length` tokens are truncated; batches are
    /// padded to their longest member.
    pub fn from_model_dir(model_dir: &Path, max_length: usize) -> Result<Self> {
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {}",
            model_dir.display()
        );
        anyhow::ensure!(max_length > 0, "max_length must be positive");

        let mut inner = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to configure truncation: {e}"))?;

        inner.with_padding(Some(PaddingParams::default()));

        Ok(Self { inner, max_length })
    }

    /// Tokenize a single text, returning input IDs and attention mask.
    pub fn tokenize(&self, text: &str) -> Result<TokenizerOutput> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("failed to encode text: {e}"))?;

        Ok(TokenizerOutput::from_encoding(&encoding))
    }

    /// Tokenize multiple texts; every output has the same length.
    pub fn tokenize_batch(&self, texts: &[&str]) -> Result<Vec<TokenizerOutput>> {
        let encodings = self
            .inner
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("failed to encode batch: {e}"))?;

        Ok(encodings.iter().map(TokenizerOutput::from_encoding).collect())
    }

    /// Get the vocabulary size.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(false)
    }

    /// Get the configured maximum sequence length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

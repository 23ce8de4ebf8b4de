//! Answer generation from retrieved snippets.
//!
//! The language model itself is an external service; this module only
//! fixes the instruction it receives and the shape of the call.
pub mod chat;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Reply the model is told to give for questions outside the Charter.
pub const REFUSAL_MESSAGE: &str =
    "I'm sorry, I can only provide information about the Fundamental Rights in the European Union.";

/// System instruction sent with every question.
pub fn system_prompt() -> String {
    format!(
        "You are an AI assistant providing concise and accurate answers about the Fundamental Rights in the European Union. \
If a user prompted you with a question not related to fundamental rights, you should answer with \"{REFUSAL_MESSAGE}\"."
    )
}

/// User turn combining the question with the retrieved context.
#[must_use]
pub fn user_message(question: &str, snippets: &[String]) -> String {
    format!("Query: {question}\nContext: {}", snippets.join(" "))
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no answer")]
    EmptyResponse,

    #[error("request timed out after {0:?} (retried once)")]
    Timeout(Duration),
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Answer `question` grounded on `snippets`.
    async fn generate_answer(
        &self,
        question: &str,
        snippets: &[String],
    ) -> Result<String, GenerationError>;
}

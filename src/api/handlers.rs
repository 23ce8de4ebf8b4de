use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::server::AppState;
use crate::generator::GenerationError;
use crate::retriever::{RetrievalError, retrieve};

pub const WELCOME_MESSAGE: &str = "Welcome to the RAG API! Use the /ask endpoint to submit questions about the Fundamental Rights of the European Union.";

// ── Request / response bodies ────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub relevant_snippets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    EmptyQuestion,
    Retrieval(RetrievalError),
    Generation(GenerationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::EmptyQuestion => (
                StatusCode::BAD_REQUEST,
                "question must not be empty".to_string(),
            ),
            ApiError::Retrieval(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error retrieving sections: {e}"),
            ),
            ApiError::Generation(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error generating answer: {e}"),
            ),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

/// Retrieve snippets for the question and have the model answer from them.
///
/// An empty index is not an error: the sentinel snippet is passed through
/// and the request still succeeds.
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::EmptyQuestion);
    }

    let snippets = retrieve(&state.rag, question, state.top_k)
        .await
        .map_err(|e| {
            error!("Retrieval failed: {e}");
            ApiError::Retrieval(e)
        })?;

    let answer = state
        .generator
        .generate_answer(question, &snippets)
        .await
        .map_err(|e| {
            error!("Answer generation failed: {e}");
            ApiError::Generation(e)
        })?;

    info!("Answered question with {} snippet(s)", snippets.len());
    Ok(Json(AnswerResponse {
        answer,
        relevant_snippets: snippets,
    }))
}

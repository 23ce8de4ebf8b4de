//! # Charter RAG — retrieval-augmented answers over the EU Charter
//!
//! Extracts the Charter of Fundamental Rights from its PDF, splits it into
//! one section per article, embeds every section into an in-memory vector
//! index, and answers questions over HTTP from the nearest sections.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading and validation
//! - **[`indexer`]** — PDF text extraction, article splitting and cleaning, index build
//! - **[`embedder`]** — Sentence embeddings via ONNX Runtime (all-MiniLM-L6-v2)
//! - **[`db`]** — In-memory SQLite + sqlite-vec vector index
//! - **[`context`]** — Index handle and embedder passed explicitly to the pipeline
//! - **[`retriever`]** — Query embedding and nearest-section lookup
//! - **[`generator`]** — Answer generation through a chat-completions API
//! - **[`api`]** — axum HTTP server (`GET /`, `POST /ask`)

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod embedder;
pub mod generator;
pub mod indexer;
pub mod retriever;

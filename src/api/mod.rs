//! HTTP surface: `GET /` and `POST /ask`.
pub mod handlers;
pub mod server;

pub use server::{AppState, router, serve};

//! Read-only inspection endpoints.
//!
//! Each call dumps the full log; there is no pagination or filtering.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use chatbridge_types::record::{PromptRecord, ResponseRecord};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub prompts: Vec<PromptRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ResponsesResponse {
    pub responses: Vec<ResponseRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub memory: String,
}

/// GET /api/prompts
pub async fn list_prompts(State(state): State<AppState>) -> Json<PromptsResponse> {
    let prompts = state.session.log().prompts();
    let total = prompts.len();
    Json(PromptsResponse { prompts, total })
}

/// GET /api/responses
pub async fn list_responses(State(state): State<AppState>) -> Json<ResponsesResponse> {
    let responses = state.session.log().responses();
    let total = responses.len();
    Json(ResponsesResponse { responses, total })
}

/// GET /api/memory - current summary text.
pub async fn get_memory(State(state): State<AppState>) -> Json<MemoryResponse> {
    Json(MemoryResponse {
        memory: state.session.memory().summary(),
    })
}

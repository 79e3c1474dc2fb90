use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::identity::resolve_identity;
use crate::models::{ChatRequest, ChatResponse};
use crate::services::{chat_service::ChatService, AppState};

pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = resolve_identity(req.user_id.as_deref(), &headers);
    tracing::info!(
        "Chat request from {}",
        identity
            .user_id()
            .map(|id| id.as_str())
            .unwrap_or("anonymous caller")
    );

    let service = ChatService::new(
        state.chat_history.clone(),
        state.generator.clone(),
        &state.config,
    );
    let response = service
        .reply(&identity, &req.message, req.city.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        status: "success",
        response,
    }))
}

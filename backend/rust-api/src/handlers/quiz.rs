use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::identity::{resolve_identity, UserId};
use crate::models::quiz::{
    ActionButton, QuizExhaustedResponse, QuizRoundRequest, QuizRoundResponse, QuizSubmitRequest,
    QuizSubmitResponse,
};
use crate::services::{
    quiz_service::{round_message, QuizService, RoundOutcome, EXHAUSTED_MESSAGE},
    AppState,
};

fn quiz_service(state: &AppState) -> QuizService {
    QuizService::new(
        state.quiz_store.clone(),
        state.generator.clone(),
        &state.config,
    )
}

pub async fn start_round(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<QuizRoundRequest>,
) -> Result<Response, ApiError> {
    let identity = resolve_identity(req.user_id.as_deref(), &headers);
    let user_id = identity
        .user_id()
        .ok_or_else(|| ApiError::validation("user_id is required"))?;

    tracing::info!("Quiz round requested by {}", user_id);

    let outcome = quiz_service(&state)
        .start_round(user_id, req.city.as_deref())
        .await?;

    let response = match outcome {
        RoundOutcome::Started {
            questions,
            attempts_left,
        } => Json(QuizRoundResponse {
            status: "success",
            message: round_message(attempts_left),
            questions: questions.to_vec(),
            attempts_left,
        })
        .into_response(),
        RoundOutcome::Exhausted => Json(QuizExhaustedResponse {
            status: "error",
            message: EXHAUSTED_MESSAGE,
            buttons: vec![ActionButton::START_NEW_LISTING],
        })
        .into_response(),
    };
    Ok(response)
}

pub async fn submit_answers(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<QuizSubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::parse(&req.user_id)
        .ok_or_else(|| ApiError::validation("user_id is required"))?;

    tracing::info!(
        "Quiz answers submitted by {} ({} answers)",
        user_id,
        req.answers.len()
    );

    let outcome = quiz_service(&state).submit(&user_id, &req.answers).await?;

    Ok(Json(QuizSubmitResponse {
        status: outcome.status(),
        message: outcome.message(),
        score: outcome.score(),
        buttons: outcome.buttons(),
    }))
}

use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::models::{OtpSendRequest, OtpVerifyRequest};
use crate::services::{otp_service::OtpService, AppState};

pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<OtpSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("OTP send requested for +{} mobile", req.country_code);

    let reply = OtpService::new(state.http.clone(), &state.config)
        .send(&req)
        .await?;
    Ok((reply.status, Json(reply.body)))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<OtpVerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("OTP verification requested for +{} mobile", req.country_code);

    let reply = OtpService::new(state.http.clone(), &state.config)
        .verify(&req)
        .await?;
    Ok((reply.status, Json(reply.body)))
}

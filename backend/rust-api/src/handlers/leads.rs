use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::models::{
    OwnerRegistrationRequest, OwnerRegistrationResponse, PropertyData, SubmitResponse,
};
use crate::services::{lead_service::LeadService, AppState};

const API_KEY_HEADERS: [&str; 2] = ["api_key", "x-api-key"];

pub async fn submit_property(
    State(state): State<Arc<AppState>>,
    AppJson(data): AppJson<PropertyData>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Property submission: {} / {} in {}",
        data.user_type,
        data.listing_type,
        data.city
    );

    LeadService::new(state.leads.clone(), &state.config)
        .submit_listing(data)
        .await?;

    Ok(Json(SubmitResponse {
        status: "success",
        message: "Data submitted successfully",
    }))
}

pub async fn register_owner(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<OwnerRegistrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let api_key = API_KEY_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()));

    tracing::info!("Owner registration from source {}", req.source);

    let lead_id = LeadService::new(state.leads.clone(), &state.config)
        .register_owner(api_key, req)
        .await?;

    Ok(Json(OwnerRegistrationResponse {
        status: 1,
        message: "Owner registered successfully",
        lead_id,
    }))
}

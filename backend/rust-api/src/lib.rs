use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod llm;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Static liveness and diagnostics
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/pingdb", get(handlers::ping_db))
        .route("/metrics", get(handlers::metrics_handler))
        // Generator-backed endpoints
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/quiz/game", post(handlers::quiz::start_round))
        .route("/api/quiz/submit", post(handlers::quiz::submit_answers))
        // Lead capture
        .route("/submit", post(handlers::leads::submit_property))
        .route(
            "/api/SecondaryPortal/ownerRegistration",
            post(handlers::leads::register_owner),
        )
        // OTP gateway proxy
        .route("/api/otp/send", post(handlers::otp::send_otp))
        .route("/api/otp/verify", post(handlers::otp::verify_otp))
        .route_layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::cors::cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::otp::{OtpSendRequest, OtpVerifyRequest};

/// Which gateway call is being proxied; decides the path and the messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpAction {
    Send,
    Verify,
}

impl OtpAction {
    fn path(self) -> &'static str {
        match self {
            OtpAction::Send => "/api/otp/send",
            OtpAction::Verify => "/api/otp/verify",
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            OtpAction::Send => "OTP sent successfully",
            OtpAction::Verify => "Verification successful",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            OtpAction::Send => "Failed to send OTP",
            OtpAction::Verify => "Error verifying OTP",
        }
    }
}

/// Gateway reply relayed to the caller as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxiedReply {
    pub status: StatusCode,
    pub body: Value,
}

/// Transparent proxy to the OTP gateway. Calls are never retried: a repeated
/// send would text the user twice.
pub struct OtpService {
    http: Client,
    base_url: String,
}

impl OtpService {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.otp.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send(&self, request: &OtpSendRequest) -> Result<ProxiedReply, ApiError> {
        self.forward(OtpAction::Send, request).await
    }

    pub async fn verify(&self, request: &OtpVerifyRequest) -> Result<ProxiedReply, ApiError> {
        self.forward(OtpAction::Verify, request).await
    }

    async fn forward<B: Serialize>(&self, action: OtpAction, body: &B) -> Result<ProxiedReply, ApiError> {
        let url = format!("{}{}", self.base_url, action.path());

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OTP gateway call to {} failed: {}", url, e);
                ApiError::Transient(format!("{}: {}", action.failure_prefix(), e))
            })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);
        let text = response.text().await.map_err(|e| {
            ApiError::Transient(format!("{}: {}", action.failure_prefix(), e))
        })?;

        tracing::info!("OTP gateway {} answered {}", action.path(), status);

        Ok(ProxiedReply {
            status,
            body: relay_body(action, is_json, &text),
        })
    }
}

fn relay_body(action: OtpAction, is_json: bool, text: &str) -> Value {
    if is_json {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value;
        }
    }
    let message = if text.trim().is_empty() {
        action.default_message()
    } else {
        text
    };
    json!({ "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_passes_through() {
        let body = relay_body(OtpAction::Send, true, r#"{"status":true,"requestId":"r-1"}"#);
        assert_eq!(body, json!({ "status": true, "requestId": "r-1" }));
    }

    #[test]
    fn test_plain_text_is_wrapped() {
        assert_eq!(
            relay_body(OtpAction::Verify, false, "OTP expired"),
            json!({ "message": "OTP expired" })
        );
    }

    #[test]
    fn test_empty_body_uses_action_default() {
        assert_eq!(
            relay_body(OtpAction::Send, false, ""),
            json!({ "message": "OTP sent successfully" })
        );
        assert_eq!(
            relay_body(OtpAction::Verify, true, ""),
            json!({ "message": "Verification successful" })
        );
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_500_with_prefix() {
        let mut config = Config::for_tests();
        config.otp.base_url = "http://127.0.0.1:9".into();
        let service = OtpService::new(Client::new(), &config);

        let err = service
            .send(&OtpSendRequest {
                country_code: "91".into(),
                mobile: "9876543210".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to send OTP: "));
    }
}

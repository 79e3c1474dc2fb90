use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSendRequest {
    pub country_code: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    pub country_code: String,
    pub mobile: String,
    pub otp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_body_keeps_gateway_field_names() {
        let req = OtpVerifyRequest {
            country_code: "91".into(),
            mobile: "9876543210".into(),
            otp: "1234".into(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "countryCode": "91", "mobile": "9876543210", "otp": "1234" })
        );
    }
}

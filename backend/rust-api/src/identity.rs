use axum::http::HeaderMap;
use std::fmt;

pub const USER_PHONE_HEADER: &str = "x-user-phone";

const ANONYMOUS_SENTINEL: &str = "anonymous";

/// Opaque, non-blank user identifier used as the document key for history and
/// quiz sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for blank input and for the legacy "anonymous" sentinel.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ANONYMOUS_SENTINEL) {
            None
        } else {
            Some(UserId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    Known(UserId),
    Anonymous,
}

impl UserIdentity {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            UserIdentity::Known(id) => Some(id),
            UserIdentity::Anonymous => None,
        }
    }
}

/// Body `user_id` wins, then the `X-User-Phone` header, otherwise anonymous.
pub fn resolve_identity(body_user_id: Option<&str>, headers: &HeaderMap) -> UserIdentity {
    if let Some(id) = body_user_id.and_then(UserId::parse) {
        return UserIdentity::Known(id);
    }

    let from_header = headers
        .get(USER_PHONE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(UserId::parse);

    match from_header {
        Some(id) => UserIdentity::Known(id),
        None => {
            tracing::debug!("No user_id or X-User-Phone header provided, request is anonymous");
            UserIdentity::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_phone(phone: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_PHONE_HEADER, HeaderValue::from_str(phone).unwrap());
        headers
    }

    #[test]
    fn body_user_id_takes_precedence() {
        let identity = resolve_identity(Some("user-1"), &headers_with_phone("9876543210"));
        assert_eq!(identity, UserIdentity::Known(UserId::parse("user-1").unwrap()));
    }

    #[test]
    fn header_used_when_body_blank() {
        let identity = resolve_identity(Some("   "), &headers_with_phone("9876543210"));
        assert_eq!(identity.user_id().map(UserId::as_str), Some("9876543210"));
    }

    #[test]
    fn missing_identity_is_anonymous() {
        assert_eq!(resolve_identity(None, &HeaderMap::new()), UserIdentity::Anonymous);
        assert_eq!(
            resolve_identity(None, &headers_with_phone("anonymous")),
            UserIdentity::Anonymous
        );
        assert_eq!(UserId::parse("Anonymous"), None);
    }
}

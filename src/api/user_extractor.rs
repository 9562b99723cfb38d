use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use crate::model::UserContext;

/// Axum extractor for the viewer of a request.
///
/// - X-User-Id: user identifier; requests without it are anonymous
/// - X-User-Name: optional display name
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(user_from_headers(&parts.headers))
    }
}

pub fn user_from_headers(headers: &HeaderMap) -> UserContext {
    match extract_header_value(headers, "x-user-id") {
        Some(user_id) => {
            let user_name = extract_header_value(headers, "x-user-name");
            UserContext::with_details(user_id, user_name)
        }
        None => UserContext::anonymous(),
    }
}

/// Extract a non-blank header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_user_context_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("user2"),
        );
        headers.insert(
            HeaderName::from_static("x-user-name"),
            HeaderValue::from_static("User Two"),
        );

        let ctx = user_from_headers(&headers);
        assert_eq!(ctx.user_id, Some("user2".to_string()));
        assert_eq!(ctx.user_name, Some("User Two".to_string()));
    }

    #[test]
    fn test_missing_or_blank_id_is_anonymous() {
        assert!(user_from_headers(&HeaderMap::new()).is_anonymous());

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("  "),
        );
        assert!(user_from_headers(&headers).is_anonymous());
    }
}

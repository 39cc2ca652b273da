use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const MAX_AGE: &str = "86400";

/// Origin allow-list. A request origin on the list is reflected back;
/// anything else gets the first entry.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed: Arc<[HeaderValue]>,
}

impl CorsPolicy {
    pub fn new(origins: &[String]) -> Self {
        let mut allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring allowed origin with invalid characters: {:?}", origin);
                    None
                }
            })
            .collect();

        if allowed.is_empty() {
            allowed.push(HeaderValue::from_static("*"));
        }

        Self {
            allowed: allowed.into(),
        }
    }

    pub fn resolve_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        match origin {
            Some(origin) if self.allowed.contains(origin) => origin.clone(),
            _ => self.allowed[0].clone(),
        }
    }

    /// Sets Allow-Origin, Allow-Methods and Allow-Headers, replacing
    /// whatever the backend sent.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.resolve_origin(origin),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }

    pub fn preflight(&self, origin: Option<&HeaderValue>) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        self.apply(headers, origin);
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE),
        );
        response
    }
}

/// Answers every `OPTIONS` request before routing.
pub async fn preflight_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        tracing::debug!("CORS preflight for {}", req.uri());
        return state.cors.preflight(req.headers().get(header::ORIGIN));
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(origins: &[&str]) -> CorsPolicy {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        CorsPolicy::new(&origins)
    }

    #[test]
    fn test_wildcard_by_default() {
        let cors = policy(&[]);
        assert_eq!(cors.resolve_origin(None), "*");
        assert_eq!(
            cors.resolve_origin(Some(&HeaderValue::from_static("https://anywhere.example"))),
            "*"
        );
    }

    #[test]
    fn test_allowed_origin_is_reflected() {
        let cors = policy(&["https://a.example", "https://b.example"]);
        let b = HeaderValue::from_static("https://b.example");
        assert_eq!(cors.resolve_origin(Some(&b)), "https://b.example");
    }

    #[test]
    fn test_unknown_origin_gets_first_entry() {
        let cors = policy(&["https://a.example", "https://b.example"]);
        let evil = HeaderValue::from_static("https://evil.example");
        assert_eq!(cors.resolve_origin(Some(&evil)), "https://a.example");
        assert_eq!(cors.resolve_origin(None), "https://a.example");
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let cors = policy(&["bad\norigin", "https://ok.example"]);
        assert_eq!(cors.resolve_origin(None), "https://ok.example");
    }

    #[test]
    fn test_preflight_headers() {
        let cors = policy(&["https://a.example"]);
        let response = cors.preflight(Some(&HeaderValue::from_static("https://a.example")));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOW_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOW_HEADERS);
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn test_apply_replaces_backend_headers() {
        let cors = policy(&["https://a.example"]);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        cors.apply(&mut headers, None);
        assert_eq!(headers.get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
    }
}

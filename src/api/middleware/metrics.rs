use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Which branch of the edge router served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Preflight,
    Proxy,
    Health,
    Static,
}

impl RouteKind {
    pub fn classify(method: &Method, path: &str) -> Self {
        if method == Method::OPTIONS {
            RouteKind::Preflight
        } else if path.starts_with("/api/") {
            RouteKind::Proxy
        } else if path == "/health" {
            RouteKind::Health
        } else {
            RouteKind::Static
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Preflight => "preflight",
            RouteKind::Proxy => "proxy",
            RouteKind::Health => "health",
            RouteKind::Static => "static",
        }
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = RouteKind::classify(&method, &path);

    let response = next.run(req).await;

    let latency_ms = start.elapsed().as_millis();
    let status = response.status();

    // 502-504 on a proxied call means the backend is the problem
    if route == RouteKind::Proxy && is_upstream_failure(status) {
        warn!(
            target: "metrics",
            method = %method,
            path = %path,
            route = route.as_str(),
            status = status.as_u16(),
            latency_ms = latency_ms,
            "upstream_failed"
        );
    } else {
        info!(
            target: "metrics",
            method = %method,
            path = %path,
            route = route.as_str(),
            status = status.as_u16(),
            latency_ms = latency_ms,
            "request_completed"
        );
    }

    response
}

fn is_upstream_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            RouteKind::classify(&Method::OPTIONS, "/api/papers"),
            RouteKind::Preflight
        );
        assert_eq!(
            RouteKind::classify(&Method::POST, "/api/papers/upload"),
            RouteKind::Proxy
        );
        assert_eq!(RouteKind::classify(&Method::GET, "/health"), RouteKind::Health);
        assert_eq!(RouteKind::classify(&Method::GET, "/api"), RouteKind::Static);
        assert_eq!(RouteKind::classify(&Method::GET, "/"), RouteKind::Static);
    }

    #[test]
    fn test_upstream_failure() {
        assert!(is_upstream_failure(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_upstream_failure(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_upstream_failure(StatusCode::NOT_FOUND));
    }
}

use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

pub const LANDING_PAGE: &str = include_str!("../../../static/index.html");

/// `/`, `/index.html` and any dot-less path (client-side routes) get the
/// landing page; anything that looks like a file is a 404.
pub async fn static_content(uri: Uri) -> Response {
    let path = uri.path();

    if serves_landing_page(path) {
        return (
            [
                (header::CONTENT_TYPE, "text/html;charset=UTF-8"),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            LANDING_PAGE,
        )
            .into_response();
    }

    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "Not Found",
    )
        .into_response()
}

pub fn serves_landing_page(path: &str) -> bool {
    path == "/" || path == "/index.html" || !path.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serves_landing_page() {
        assert!(serves_landing_page("/"));
        assert!(serves_landing_page("/index.html"));
        assert!(serves_landing_page("/summarize"));
        assert!(serves_landing_page("/papers/42/view"));
        assert!(!serves_landing_page("/favicon.ico"));
        assert!(!serves_landing_page("/static/js/main.3f2a.js"));
    }

    #[test]
    fn test_landing_page_is_html() {
        assert!(LANDING_PAGE.trim_start().starts_with("<!DOCTYPE html>"));
        assert!(LANDING_PAGE.contains("Academic Summarizer"));
    }
}

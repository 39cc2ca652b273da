use crate::AppState;
use crate::api::error::ProxyError;
use crate::api::handlers::site;
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, Uri, header},
    response::Response,
};
use http_body_util::LengthLimitError;
use url::Url;

/// Only targets under this prefix are forwarded.
const API_PREFIX: &str = "/api/";

/// Connection-scoped headers; the HTTP client and server set their own.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwards an `/api/*` request to the backend with the same method,
/// headers and body, then rewrites the CORS headers on the way back.
pub async fn forward(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let origin = parts.headers.get(header::ORIGIN).cloned();
    let target = backend_target(&state.config.backend_url, &parts.uri)?;

    // dot segments (plain or %2e) can climb out of /api/ once resolved
    if !target.path().starts_with(API_PREFIX) {
        tracing::debug!("{} resolves outside {}, serving static", parts.uri, API_PREFIX);
        let normalized = target
            .path()
            .parse::<Uri>()
            .map_err(|e| ProxyError::Internal(format!("invalid normalized path: {e}")))?;
        return Ok(site::static_content(normalized).await);
    }

    let body = to_bytes(body, state.config.max_body_size)
        .await
        .map_err(body_error)?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    // recomputed from the buffered body
    headers.remove(header::CONTENT_LENGTH);

    tracing::debug!("Proxying {} {} -> {}", parts.method, parts.uri, target);

    let upstream = state
        .http
        .request(parts.method, target)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(ProxyError::BackendUnavailable)?;

    let status = upstream.status();
    let mut upstream_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut upstream_headers);

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| ProxyError::Internal(format!("failed to build response: {e}")))?;

    *response.headers_mut() = upstream_headers;
    state.cors.apply(response.headers_mut(), origin.as_ref());

    Ok(response)
}

/// Resolves the request's path and query against the backend origin.
pub fn backend_target(backend: &Url, uri: &Uri) -> Result<Url, ProxyError> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    backend
        .join(path_and_query)
        .map_err(|e| ProxyError::Internal(format!("invalid backend target '{path_and_query}': {e}")))
}

/// Only an exceeded size limit is a 413; anything else means the body
/// could not be read.
fn body_error(err: axum::Error) -> ProxyError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ProxyError::PayloadTooLarge(e.to_string());
        }
        source = std::error::Error::source(e);
    }
    ProxyError::BadRequest(format!("failed to read request body: {err}"))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // headers named by `Connection` are hop-by-hop too
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
    for name in &listed {
        headers.remove(name.as_str());
    }
}

pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::{health, proxy, site};
use crate::api::middleware::{cors, metrics, request_id};
use crate::config::ProxyConfig;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::any,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub http: reqwest::Client,
    pub cors: cors::CorsPolicy,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> anyhow::Result<Self> {
        // redirects are the browser's business, not the proxy's
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            cors: cors::CorsPolicy::new(&config.allowed_origins),
            config: Arc::new(config),
            http,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", any(health::health_check))
        .route("/api/", any(proxy::forward))
        .route("/api/*path", any(proxy::forward))
        .fallback(site::static_content)
        .layer(from_fn_with_state(
            state.clone(),
            cors::preflight_middleware,
        ))
        .layer(CatchPanicLayer::custom(api::error::panic_response))
        .layer(from_fn(metrics::metrics_middleware))
        .layer(from_fn(request_id::request_id_middleware))
        .with_state(state)
}

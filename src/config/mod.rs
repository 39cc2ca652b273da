use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use url::Url;

/// Largest PDF the backend accepts (50 MB)
pub const MAX_PDF_SIZE: usize = 50 * 1024 * 1024;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8787";

/// Configuration for the edge proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Origin every `/api/*` request is forwarded to (default: "http://127.0.0.1:8001")
    pub backend_url: Url,

    /// Origins reflected in `Access-Control-Allow-Origin` (default: ["*"])
    pub allowed_origins: Vec<String>,

    /// Listen address (default: 0.0.0.0)
    pub host: IpAddr,

    /// Listen port (default: 8787)
    pub port: u16,

    /// Upper bound for a single forwarded request, in seconds (default: 120)
    pub request_timeout_secs: u64,

    /// Maximum request body accepted from clients (default: 51 MB)
    pub max_body_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backend_url: default_url(DEFAULT_BACKEND_URL),
            allowed_origins: vec!["*".to_string()],
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8787,
            request_timeout_secs: 120,
            // multipart framing adds a little on top of the file itself
            max_body_size: MAX_PDF_SIZE + 1024 * 1024,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            backend_url: lookup("BACKEND_URL")
                .and_then(|v| parse_url("BACKEND_URL", &v))
                .unwrap_or(default.backend_url),

            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(default.allowed_origins),

            host: lookup("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.host),

            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            request_timeout_secs: lookup("PROXY_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),

            max_body_size: lookup("MAX_BODY_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_body_size),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for the paper client and the summarizer CLI
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Public origin of the deployment; the client talks to `<backend_url>/api`
    pub backend_url: Url,

    /// Per-request timeout in seconds, generous for uploads (default: 60)
    pub timeout_secs: u64,

    /// Delay between two status polls in milliseconds (default: 2000)
    pub poll_interval_ms: u64,

    /// Largest file accepted for upload (default: 50 MB)
    pub max_upload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_url(DEFAULT_PUBLIC_URL),
            timeout_secs: 60,
            poll_interval_ms: 2000,
            max_upload_size: MAX_PDF_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            backend_url: lookup("REACT_APP_BACKEND_URL")
                .and_then(|v| parse_url("REACT_APP_BACKEND_URL", &v))
                .unwrap_or(default.backend_url),

            timeout_secs: lookup("CLIENT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.timeout_secs),

            poll_interval_ms: lookup("POLL_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.poll_interval_ms),

            max_upload_size: lookup("MAX_UPLOAD_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Splits a comma-separated origin list, dropping blank entries.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_url(key: &str, raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Ignoring invalid {} '{}': {}", key, raw, e);
            None
        }
    }
}

fn default_url(raw: &str) -> Url {
    Url::parse(raw).expect("default URL is valid")
}

use crate::config::ClientConfig;
use crate::models::{Download, DownloadFormat, HtmlBlog, Paper, StatusResponse, Summary};
use crate::utils::validation::{
    ValidationError, mime_from_path, sanitize_filename, validate_file_size, validate_mime_type, validate_pdf_upload,
};
use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, multipart};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// How many leading bytes are inspected for the PDF signature
const HEADER_PEEK: usize = 1024;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Processing failed for paper {0}")]
    ProcessingFailed(String),

    #[error("No PDF selected")]
    NoFileSelected,
}

impl ClientError {
    /// True when the backend answered with the given status code.
    pub fn is_status(&self, code: StatusCode) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == code)
    }
}

/// A PDF read from disk that already passed client-side validation.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub path: PathBuf,
    pub filename: String,
    pub bytes: Bytes,
}

impl PdfFile {
    pub async fn load(path: impl AsRef<Path>, max_size: usize) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content_type = mime_from_path(path);
        validate_mime_type(content_type.essence_str())?;

        let size = tokio::fs::metadata(path).await?.len() as usize;
        validate_file_size(size, max_size)?;

        let bytes = Bytes::from(tokio::fs::read(path).await?);
        let raw_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let header = &bytes[..bytes.len().min(HEADER_PEEK)];
        let filename = validate_pdf_upload(
            &raw_name,
            content_type.essence_str(),
            bytes.len(),
            header,
            max_size,
        )?;

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// The backend's paper REST contract.
#[async_trait]
pub trait PaperApi: Send + Sync {
    /// `POST /papers/upload`
    async fn upload_paper(&self, file: &PdfFile) -> Result<Paper, ClientError>;

    /// `GET /papers/{id}/status`
    async fn get_status(&self, paper_id: &str) -> Result<StatusResponse, ClientError>;

    /// `GET /papers/{id}/summary`
    async fn get_summary(&self, paper_id: &str) -> Result<Summary, ClientError>;

    /// `GET /papers/{id}/html`
    async fn get_html(&self, paper_id: &str) -> Result<HtmlBlog, ClientError>;

    /// `GET /papers/{id}/download/{format}`
    async fn download(
        &self,
        paper_id: &str,
        format: DownloadFormat,
    ) -> Result<Download, ClientError>;

    /// `GET /papers`
    async fn list_papers(&self) -> Result<Vec<Paper>, ClientError>;
}

/// reqwest-backed implementation talking to `<backend>/api`.
#[derive(Clone)]
pub struct PaperClient {
    http: Client,
    api_base: Url,
}

impl PaperClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Self::with_client(http, &config.backend_url)
    }

    pub fn with_client(http: Client, backend_url: &Url) -> Result<Self, ClientError> {
        let mut api_base = backend_url.clone();
        api_base
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(backend_url.to_string()))?
            .pop_if_empty()
            .push("api");
        Ok(Self { http, api_base })
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Appends path segments to the API base; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        tracing::debug!("GET {}", url);
        let response = check_status(self.http.get(url).send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl PaperApi for PaperClient {
    async fn upload_paper(&self, file: &PdfFile) -> Result<Paper, ClientError> {
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(mime::APPLICATION_PDF.essence_str())?;
        let form = multipart::Form::new().part("file", part);

        let url = self.endpoint(&["papers", "upload"]);
        tracing::info!("Uploading {} ({} bytes) to {}", file.filename, file.size(), url);

        let response = check_status(self.http.post(url).multipart(form).send().await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_status(&self, paper_id: &str) -> Result<StatusResponse, ClientError> {
        self.get_json(self.endpoint(&["papers", paper_id, "status"]))
            .await
    }

    async fn get_summary(&self, paper_id: &str) -> Result<Summary, ClientError> {
        self.get_json(self.endpoint(&["papers", paper_id, "summary"]))
            .await
    }

    async fn get_html(&self, paper_id: &str) -> Result<HtmlBlog, ClientError> {
        self.get_json(self.endpoint(&["papers", paper_id, "html"]))
            .await
    }

    async fn download(
        &self,
        paper_id: &str,
        format: DownloadFormat,
    ) -> Result<Download, ClientError> {
        let url = self.endpoint(&["papers", paper_id, "download", format.as_str()]);
        tracing::debug!("GET {}", url);
        let response = check_status(self.http.get(url).send().await?).await?;

        let headers = response.headers();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .and_then(|name| sanitize_filename(&name).ok())
            .unwrap_or_else(|| format.default_filename().to_string());
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Download {
            filename,
            content_type,
            bytes: response.bytes().await?,
        })
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, ClientError> {
        self.get_json(self.endpoint(&["papers"])).await
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status,
        detail: error_detail(&body),
    })
}

/// Pulls the human-readable message out of an error body.
/// FastAPI uses `detail`, the proxy envelope uses `message`/`error`.
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|d| d.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Reads the suggested file name from a `Content-Disposition` value,
/// preferring the RFC 5987 `filename*` form.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.trim().rsplit("''").next().unwrap_or("");
                let decoded = percent_decode_str(encoded).decode_utf8_lossy();
                if !decoded.is_empty() {
                    return Some(decoded.into_owned());
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_api_base_and_endpoints() {
        let config = ClientConfig::default();
        let client = PaperClient::new(&config).unwrap();
        assert_eq!(client.api_base().as_str(), "http://127.0.0.1:8787/api");
        assert_eq!(
            client.endpoint(&["papers", "abc", "status"]).as_str(),
            "http://127.0.0.1:8787/api/papers/abc/status"
        );
        // ids are opaque; slashes must not create extra path segments
        assert_eq!(
            client.endpoint(&["papers", "a/b", "html"]).as_str(),
            "http://127.0.0.1:8787/api/papers/a%2Fb/html"
        );
    }

    #[test]
    fn test_api_base_keeps_prefix() {
        let backend = Url::parse("https://example.org/summarizer/").unwrap();
        let client = PaperClient::with_client(Client::new(), &backend).unwrap();
        assert_eq!(client.api_base().as_str(), "https://example.org/summarizer/api");
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"Paper not found"}"#), "Paper not found");
        assert_eq!(
            error_detail(
                r#"{"error":"Backend service unavailable","message":"Unable to connect to the backend service"}"#
            ),
            "Unable to connect to the backend service"
        );
        assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="summary.json""#).as_deref(),
            Some("summary.json")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf; filename=\"resume.pdf\"")
                .as_deref(),
            Some("résumé.pdf")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[tokio::test]
    async fn test_pdf_file_load() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("paper.pdf");
        std::fs::File::create(&good)
            .unwrap()
            .write_all(b"%PDF-1.5\n1 0 obj\n")
            .unwrap();
        let file = PdfFile::load(&good, 1024).await.unwrap();
        assert_eq!(file.filename, "paper.pdf");
        assert_eq!(file.size(), 17);

        let renamed = dir.path().join("image.pdf");
        std::fs::write(&renamed, [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        let err = PdfFile::load(&renamed, 1024).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref e) if e.code == "NOT_A_PDF"));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"%PDF but not really").unwrap();
        let err = PdfFile::load(&text, 1024).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref e) if e.code == "INVALID_MIME_TYPE"));

        let err = PdfFile::load(&good, 8).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ref e) if e.code == "FILE_TOO_LARGE"));
    }
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a paper as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    /// `completed` and `failed` end the polling loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub upload_date: DateTime<Utc>,
    pub status: ProcessingStatus,
    #[serde(default)]
    pub processing_progress: u8,
}

impl Paper {
    /// Title extracted by the backend, or the uploaded file name until then.
    pub fn display_title(&self) -> &str {
        self.original_title.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: ProcessingStatus,
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub heading: String,
    pub content: String,
}

/// Plain-language summary of a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub introduction: String,
    pub key_points: Vec<KeyPoint>,
    pub conclusion: String,
    pub implications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlBlog {
    pub html_content: String,
}

/// Artifacts offered by `GET /papers/{id}/download/{format}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Original,
    Summary,
    Html,
}

impl DownloadFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Summary => "summary",
            Self::Html => "html",
        }
    }

    /// File name used when the backend does not suggest one.
    pub fn default_filename(self) -> &'static str {
        match self {
            Self::Original => "paper.pdf",
            Self::Summary => "summary.json",
            Self::Html => "blog-post.html",
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" | "pdf" => Ok(Self::Original),
            "summary" | "json" => Ok(Self::Summary),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "unknown format '{other}' (expected original, summary or html)"
            )),
        }
    }
}

/// A downloaded artifact and the name it should be saved under.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}

// The backend emits naive timestamps (no offset); those are UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_paper_from_backend_json() {
        let paper: Paper = serde_json::from_value(json!({
            "id": "0b7e",
            "filename": "agents.pdf",
            "original_title": null,
            "author": "Anton Korinek",
            "upload_date": "2024-12-19T10:30:00.123456",
            "status": "processing",
            "processing_progress": 30
        }))
        .unwrap();

        assert_eq!(paper.status, ProcessingStatus::Processing);
        assert_eq!(paper.processing_progress, 30);
        assert_eq!(paper.display_title(), "agents.pdf");
        assert_eq!(paper.upload_date.year(), 2024);
        assert_eq!(paper.upload_date.hour(), 10);
    }

    #[test]
    fn test_timestamp_with_offset() {
        let ts = parse_timestamp("2024-12-19T10:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 8);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ProcessingStatus::Uploaded.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }

    #[test]
    fn test_download_format_parsing() {
        assert_eq!("HTML".parse::<DownloadFormat>(), Ok(DownloadFormat::Html));
        assert_eq!("json".parse::<DownloadFormat>(), Ok(DownloadFormat::Summary));
        assert!("docx".parse::<DownloadFormat>().is_err());
        assert_eq!(DownloadFormat::Summary.default_filename(), "summary.json");
    }
}

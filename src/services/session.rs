use crate::models::{DownloadFormat, HtmlBlog, Paper, ProcessingStatus, StatusResponse, Summary};
use crate::services::paper_client::{ClientError, PaperApi, PdfFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Routes notices to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!("{}", notice.message),
            NoticeLevel::Error => tracing::error!("{}", notice.message),
        }
    }
}

/// Everything the summarizer page shows at a given moment.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub file: Option<PdfFile>,
    pub paper: Option<Paper>,
    pub status: Option<ProcessingStatus>,
    pub progress: u8,
    pub summary: Option<Summary>,
    pub html: Option<HtmlBlog>,
    pub error: Option<String>,
}

impl ViewState {
    pub fn is_processing(&self) -> bool {
        self.paper.is_some() && !self.status.is_some_and(ProcessingStatus::is_terminal)
    }

    /// Results are only shown once the backend reports completion.
    pub fn has_results(&self) -> bool {
        self.status == Some(ProcessingStatus::Completed) && self.summary.is_some()
    }
}

/// Results of a paper that reached `completed`.
#[derive(Debug, Clone)]
pub struct ProcessedPaper {
    pub paper: Paper,
    pub summary: Summary,
    pub html: HtmlBlog,
}

/// Upload-and-poll workflow for a single paper at a time.
pub struct SummarizerSession<A: PaperApi> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    max_upload_size: usize,
    state: ViewState,
}

impl<A: PaperApi> SummarizerSession<A> {
    pub fn new(
        api: Arc<A>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
        max_upload_size: usize,
    ) -> Self {
        Self {
            api,
            notifier,
            poll_interval,
            max_upload_size,
            state: ViewState::default(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Validates and selects a PDF. A rejected file leaves the previous
    /// selection in place.
    pub async fn select_file(&mut self, path: impl AsRef<Path>) -> Result<(), ClientError> {
        match PdfFile::load(path.as_ref(), self.max_upload_size).await {
            Ok(file) => {
                self.notifier
                    .notify(Notice::success(format!("{} selected", file.filename)));
                self.state.file = Some(file);
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Please upload a valid PDF file ({e})")));
                Err(e)
            }
        }
    }

    /// Uploads the selected file and polls until the backend finishes.
    /// `on_progress` sees every successful status poll.
    pub async fn process<F>(&mut self, mut on_progress: F) -> Result<ProcessedPaper, ClientError>
    where
        F: FnMut(&StatusResponse) + Send,
    {
        let file = self.state.file.clone().ok_or(ClientError::NoFileSelected)?;
        self.clear_results();

        let paper = match self.api.upload_paper(&file).await {
            Ok(paper) => paper,
            Err(e) => return Err(self.fail("Upload failed", e)),
        };
        tracing::info!("Paper {} uploaded as {}", paper.id, paper.filename);
        self.state.status = Some(paper.status);
        self.state.progress = paper.processing_progress;
        self.state.paper = Some(paper.clone());

        let status = self.poll_until_done(&paper.id, &mut on_progress).await;

        if status == ProcessingStatus::Failed {
            return Err(self.fail(
                "Processing failed",
                ClientError::ProcessingFailed(paper.id.clone()),
            ));
        }

        let summary = match self.api.get_summary(&paper.id).await {
            Ok(summary) => summary,
            Err(e) => return Err(self.fail("Could not load summary", e)),
        };
        let html = match self.api.get_html(&paper.id).await {
            Ok(html) => html,
            Err(e) => return Err(self.fail("Could not load HTML blog post", e)),
        };

        self.state.progress = 100;
        self.state.summary = Some(summary.clone());
        self.state.html = Some(html.clone());
        self.notifier
            .notify(Notice::success("Paper processed successfully!"));

        Ok(ProcessedPaper {
            paper,
            summary,
            html,
        })
    }

    /// Polls at a fixed interval. Errors are retried indefinitely.
    async fn poll_until_done<F>(&mut self, paper_id: &str, on_progress: &mut F) -> ProcessingStatus
    where
        F: FnMut(&StatusResponse) + Send,
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match self.api.get_status(paper_id).await {
                Ok(status) => {
                    self.state.status = Some(status.status);
                    self.state.progress = status.progress.min(100);
                    on_progress(&status);
                    if status.status.is_terminal() {
                        return status.status;
                    }
                }
                Err(e) => {
                    tracing::debug!("Status poll for {} failed, retrying: {}", paper_id, e);
                }
            }
        }
    }

    /// Downloads one artifact into `dir` and returns the written path.
    pub async fn download(
        &self,
        format: DownloadFormat,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, ClientError> {
        let paper = self
            .state
            .paper
            .as_ref()
            .filter(|_| self.state.has_results())
            .ok_or_else(|| ClientError::ProcessingFailed("no completed paper".to_string()))?;

        let result = async {
            let download = self.api.download(&paper.id, format).await?;
            let path = dir.as_ref().join(&download.filename);
            tokio::fs::write(&path, &download.bytes).await?;
            Ok::<_, ClientError>((download.filename, path))
        }
        .await;

        match result {
            Ok((filename, path)) => {
                self.notifier
                    .notify(Notice::success(format!("{filename} downloaded successfully!")));
                Ok(path)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(format!("Download failed: {e}")));
                Err(e)
            }
        }
    }

    /// Back to an empty upload form.
    pub fn reset(&mut self) {
        self.state = ViewState::default();
    }

    fn clear_results(&mut self) {
        let file = self.state.file.take();
        self.state = ViewState {
            file,
            ..ViewState::default()
        };
    }

    fn fail(&mut self, context: &str, error: ClientError) -> ClientError {
        let message = format!("{context}: {error}");
        tracing::warn!("{}", message);
        self.state.error = Some(message.clone());
        self.notifier.notify(Notice::error(message));
        error
    }
}

use academic_summarizer::config::ClientConfig;
use academic_summarizer::models::DownloadFormat;
use academic_summarizer::services::paper_client::{PaperApi, PaperClient, PdfFile};
use academic_summarizer::services::session::{LogNotifier, SummarizerSession};
use academic_summarizer::utils::render;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Academic Summarizer client - turn research papers into plain-language summaries
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Public URL of the deployment (overrides REACT_APP_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a PDF and wait for its summary
    Upload {
        /// Path to the PDF file
        pdf_path: PathBuf,

        /// Return as soon as the upload is accepted
        #[arg(long)]
        no_wait: bool,

        /// Also save summary.json and the blog post into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Show the processing status of a paper
    Status { paper_id: String },

    /// Print the plain-language summary of a paper
    Summary {
        paper_id: String,

        /// Print the raw JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Print or save the generated HTML blog post
    Html {
        paper_id: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Download an artifact: original, summary or html
    Download {
        paper_id: String,

        format: DownloadFormat,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// List uploaded papers
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "academic_summarizer=info,summarizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.backend_url {
        config.backend_url = url;
    }
    let client = Arc::new(PaperClient::new(&config)?);
    tracing::debug!("Using API at {}", client.api_base());

    match args.command {
        Command::Upload {
            pdf_path,
            no_wait,
            out_dir,
        } => {
            if no_wait {
                let file = PdfFile::load(&pdf_path, config.max_upload_size).await?;
                let paper = client.upload_paper(&file).await?;
                println!("{}", paper.id);
                return Ok(());
            }

            let mut session = SummarizerSession::new(
                client.clone(),
                Arc::new(LogNotifier),
                config.poll_interval(),
                config.max_upload_size,
            );
            session.select_file(&pdf_path).await?;

            let bar = progress_bar();
            let processed = session
                .process(|status| {
                    bar.set_position(status.progress.into());
                    bar.set_message(status.status.to_string());
                })
                .await;
            bar.finish_and_clear();
            let processed = processed?;

            println!("{}", render::summary_to_markdown(&processed.summary));
            eprintln!("Paper id: {}", processed.paper.id);

            if let Some(dir) = out_dir {
                tokio::fs::create_dir_all(&dir).await?;
                session.download(DownloadFormat::Summary, &dir).await?;
                session.download(DownloadFormat::Html, &dir).await?;
            }
        }
        Command::Status { paper_id } => {
            let status = client.get_status(&paper_id).await?;
            match status.message {
                Some(message) => println!("{} {}% - {}", status.status, status.progress, message),
                None => println!("{} {}%", status.status, status.progress),
            }
        }
        Command::Summary { paper_id, json } => {
            let summary = client.get_summary(&paper_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", render::summary_to_markdown(&summary));
            }
        }
        Command::Html { paper_id, output } => {
            let html = client.get_html(&paper_id).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, html.html_content).await?;
                    eprintln!("Saved {}", path.display());
                }
                None => println!("{}", html.html_content),
            }
        }
        Command::Download {
            paper_id,
            format,
            out_dir,
        } => {
            let download = client.download(&paper_id, format).await?;
            tokio::fs::create_dir_all(&out_dir).await?;
            let path = out_dir.join(&download.filename);
            tokio::fs::write(&path, &download.bytes).await?;
            eprintln!("Saved {} ({} bytes)", path.display(), download.bytes.len());
        }
        Command::List => {
            let papers = client.list_papers().await?;
            if papers.is_empty() {
                eprintln!("No papers uploaded yet.");
            } else {
                print!("{}", render::paper_table(&papers));
            }
        }
    }

    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar.set_message("uploading");
    bar
}

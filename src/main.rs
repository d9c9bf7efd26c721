//! DocuMind
//!
//! Command-line driver: takes document paths, runs them through the
//! simulated intake lifecycle, then prints each document's viewer state.
//!
//! Usage: `documind [--search TERM] [--highlight TERM] [--ask QUESTION] FILE...`

use std::path::{Path, PathBuf};

use anyhow::bail;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use documind::chat::ChatSession;
use documind::document::{format_file_size, render_view};
use documind::upload::{AcceptedFormat, DiskFile};
use documind::{AppError, Config, DocumentEvent, DocumentManager};

#[derive(Debug, Default)]
struct CliArgs {
    search: String,
    highlight: Option<String>,
    ask: Option<String>,
    files: Vec<PathBuf>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = CliArgs::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--search" | "--highlight" | "--ask" => {
                    let Some(value) = args.next() else {
                        bail!("{} needs a value", arg);
                    };
                    match arg.as_str() {
                        "--search" => parsed.search = value,
                        "--highlight" => parsed.highlight = Some(value),
                        _ => parsed.ask = Some(value),
                    }
                }
                _ => parsed.files.push(PathBuf::from(arg)),
            }
        }

        if parsed.files.is_empty() {
            bail!("usage: documind [--search TERM] [--highlight TERM] [--ask QUESTION] FILE...");
        }

        Ok(parsed)
    }
}

/// Intake filter: only text, PDF and DOCX files reach the manager
async fn accept(path: &Path) -> documind::Result<DiskFile> {
    if AcceptedFormat::from_path(path).is_none() {
        return Err(AppError::UnsupportedFile(path.display().to_string()));
    }
    Ok(DiskFile::open(path).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "documind=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting DocuMind v{}", env!("CARGO_PKG_VERSION"));

    let args = CliArgs::parse(std::env::args().skip(1))?;

    let mut sources = Vec::new();
    for path in &args.files {
        match accept(path).await {
            Ok(file) => sources.push(file),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping file"),
        }
    }

    // Room for every event of the batch, so the notice listener never drops one
    let manager = DocumentManager::new(config.lifecycle.sized_for(sources.len()));

    // Notices go to the log, standing in for toasts
    let mut events = manager.subscribe();
    let notices = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(DocumentEvent::Notice(notice)) if notice.is_failure() => {
                    tracing::warn!("{}: {}", notice.title(), notice.description());
                }
                Ok(DocumentEvent::Notice(notice)) => {
                    tracing::info!("{}: {}", notice.title(), notice.description());
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notice listener lagged, some notices were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    manager.submit(sources);
    manager.settle().await;

    let documents = manager.documents();
    for document in &documents {
        println!(
            "{} ({}, {}) - {}",
            document.name(),
            format_file_size(document.size()),
            if document.mime_type().is_empty() { "unknown" } else { document.mime_type() },
            document.status().label(),
        );

        let view = render_view(
            &documents,
            Some(document.id()),
            &args.search,
            args.highlight.as_deref(),
            &config.viewer,
        )?;
        println!("{}", serde_json::to_string_pretty(&view)?);
    }

    if let Some(question) = &args.ask {
        let chat = ChatSession::new(manager.clone(), config.chat.clone());
        match chat.send(question).await {
            Ok(()) => tracing::info!(messages = chat.history().len(), "Question answered"),
            Err(e) => tracing::warn!(error = %e, "Question not sent"),
        }
    }

    drop(manager);
    notices.await?;

    tracing::info!("DocuMind shutdown complete");
    Ok(())
}

//! Error types for DocuMind

use thiserror::Error;

use crate::chat::ChatError;
use crate::config::ConfigError;
use crate::html::HighlightError;
use crate::upload::{IngestError, TransitionError};

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Highlight error: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! DocuMind Library
//!
//! Core of the DocuMind document Q&A shell. Document intake and analysis
//! are simulated with timed steps; there is no text extraction or model.
//!
//! # Modules
//!
//! - `upload`: Document lifecycle (uploading, processing, ready, error)
//! - `document`: Selection, statistics and viewer state
//! - `html`: Escaped markup with highlighted search and AI terms
//! - `chat`: Simulated question/answer session
//! - `config`: Environment configuration

pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod html;
pub mod upload;

pub use config::Config;
pub use error::{AppError, Result};
pub use upload::{Document, DocumentEvent, DocumentManager, DocumentStatus, Notification};

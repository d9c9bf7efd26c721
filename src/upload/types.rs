//! Upload types for the document intake lifecycle

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Progress value of a fully uploaded document
pub const PROGRESS_COMPLETE: u8 = 100;

/// Default progress increment per tick
pub const DEFAULT_PROGRESS_STEP: u8 = 10;

// ============================================================================
// Document Types
// ============================================================================

/// Lifecycle status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Receiving bytes, progress is live
    Uploading,
    /// Content attached, analysis running
    Processing,
    /// Available for questions
    Ready,
    /// Intake failed
    Error,
}

impl DocumentStatus {
    /// Label shown on the document card
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploading => "Uploading...",
            Self::Processing => "Processing...",
            Self::Ready => "Ready for questions",
            Self::Error => "Error occurred",
        }
    }

    /// Whether the document still has work pending (progress bar visible)
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Uploading | Self::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One user-submitted file tracked through intake
///
/// Fields are private so that every change goes through a transition
/// method; the manager replaces whole records by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    id: Uuid,
    name: String,
    size: u64,
    mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    status: DocumentStatus,
    progress: u8,
    created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document record in the `uploading` state
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content: None,
            status: DocumentStatus::Uploading,
            progress: 0,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Move upload progress forward
    pub fn advance_progress(&mut self, progress: u8) -> Result<(), TransitionError> {
        if self.status != DocumentStatus::Uploading {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Uploading,
            });
        }
        if progress > PROGRESS_COMPLETE {
            return Err(TransitionError::ProgressOutOfRange(progress));
        }
        if progress < self.progress {
            return Err(TransitionError::ProgressRegression {
                current: self.progress,
                requested: progress,
            });
        }
        self.progress = progress;
        Ok(())
    }

    /// Attach content and start analysis
    ///
    /// Requires the upload to have reached 100%.
    pub fn begin_processing(&mut self, content: String) -> Result<(), TransitionError> {
        if self.status != DocumentStatus::Uploading || self.progress != PROGRESS_COMPLETE {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Processing,
            });
        }
        if self.content.is_some() {
            return Err(TransitionError::ContentAlreadySet);
        }
        self.content = Some(content);
        self.status = DocumentStatus::Processing;
        Ok(())
    }

    pub fn mark_ready(&mut self) -> Result<(), TransitionError> {
        if self.status != DocumentStatus::Processing {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Ready,
            });
        }
        self.status = DocumentStatus::Ready;
        Ok(())
    }

    /// Divert to the terminal `error` state
    pub fn mark_failed(&mut self) -> Result<(), TransitionError> {
        if !self.status.is_in_flight() {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: DocumentStatus::Error,
            });
        }
        self.status = DocumentStatus::Error;
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

/// User-facing notice emitted when a document settles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    Ready { document_id: Uuid, name: String },
    Failed { document_id: Uuid, name: String },
}

impl Notification {
    pub fn document_id(&self) -> Uuid {
        match self {
            Self::Ready { document_id, .. } | Self::Failed { document_id, .. } => *document_id,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "Document uploaded successfully",
            Self::Failed { .. } => "Upload failed",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Ready { name, .. } => format!("{} is ready for questions", name),
            Self::Failed { name, .. } => format!("Failed to process {}", name),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Change published by the document manager
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// A record was inserted or replaced
    Updated(Document),
    /// A record was removed by the user
    Removed(Uuid),
    Notice(Notification),
}

// ============================================================================
// Error Types
// ============================================================================

/// Rejected state change on a document record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    #[error("Progress cannot go backwards: {current} -> {requested}")]
    ProgressRegression { current: u8, requested: u8 },

    #[error("Progress out of range: {0}")]
    ProgressOutOfRange(u8),

    #[error("Content already set")]
    ContentAlreadySet,
}

/// Failure while taking a single document through intake
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Read error: {0}")]
    Read(#[from] std::io::Error),

    #[error("Content is not readable text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),
}

// ============================================================================
// Tests
// ============================================================================

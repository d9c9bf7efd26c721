//! Intake sources
//!
//! The manager takes any [`FileSource`]. Filtering by [`AcceptedFormat`]
//! belongs to whoever collects the files (file picker, CLI arguments).

use std::path::{Path, PathBuf};

use super::types::IngestError;

// ============================================================================
// File Source Trait
// ============================================================================

/// A raw file handle handed to the document manager
#[async_trait::async_trait]
pub trait FileSource: Send + Sync + 'static {
    /// Original file name
    fn name(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// MIME type, empty when unknown
    fn mime_type(&self) -> &str;

    /// Read the full text content
    async fn read_text(&self) -> Result<String, IngestError>;
}

// ============================================================================
// In-memory Source
// ============================================================================

/// File whose bytes are already in memory
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Plain text file with MIME type guessed from the name
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let mime_type = guess_mime(Path::new(&name));
        Self::new(name, mime_type, text.into().into_bytes())
    }
}

#[async_trait::async_trait]
impl FileSource for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_text(&self) -> Result<String, IngestError> {
        Ok(String::from_utf8(self.bytes.clone())?)
    }
}

// ============================================================================
// Disk Source
// ============================================================================

/// File on the local filesystem, read lazily
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: String,
}

impl DiskFile {
    /// Stat the file and capture its metadata
    pub async fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = guess_mime(&path);

        Ok(Self {
            path,
            name,
            size: metadata.len(),
            mime_type,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl FileSource for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn read_text(&self) -> Result<String, IngestError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(String::from_utf8(bytes)?)
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default()
}

// ============================================================================
// Accepted Formats
// ============================================================================

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Formats the intake collaborator lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedFormat {
    Text,
    Pdf,
    Docx,
}

impl AcceptedFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detect format from MIME type
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "text/plain" => Some(Self::Text),
            "application/pdf" => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Pdf => "application/pdf",
            Self::Docx => DOCX_MIME,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

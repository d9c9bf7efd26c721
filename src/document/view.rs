//! Document viewer state
//!
//! Pure functions over a snapshot of the collection. Nothing here writes
//! back to the document manager.

use serde::Serialize;
use uuid::Uuid;

use super::stats::DocumentStats;
use crate::config::ViewerConfig;
use crate::html::{highlight, HighlightError};
use crate::upload::{Document, DocumentStatus};

/// Pick the document to display
///
/// The selected document when it exists, otherwise the first one, and
/// `None` for an empty collection.
pub fn select_active(documents: &[Document], selected: Option<Uuid>) -> Option<&Document> {
    selected
        .and_then(|id| documents.iter().find(|d| d.id() == id))
        .or_else(|| documents.first())
}

/// Tab shown for each document when more than one is loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTab {
    pub document_id: Uuid,
    pub name: String,
    pub status: DocumentStatus,
    /// Only true for an explicit selection, not the first-document fallback
    pub selected: bool,
}

pub fn document_tabs(documents: &[Document], selected: Option<Uuid>) -> Vec<DocumentTab> {
    documents
        .iter()
        .map(|d| DocumentTab {
            document_id: d.id(),
            name: d.name().to_string(),
            status: d.status(),
            selected: selected == Some(d.id()),
        })
        .collect()
}

/// What the viewer should display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DocumentView {
    /// No documents uploaded
    Empty,
    /// Active document has no content yet
    #[serde(rename_all = "camelCase")]
    Pending {
        document_id: Uuid,
        name: String,
        status: DocumentStatus,
    },
    /// Active document with stats and highlighted body
    #[serde(rename_all = "camelCase")]
    Ready {
        document_id: Uuid,
        name: String,
        stats: DocumentStats,
        html: String,
        search_matches: usize,
        ai_matches: usize,
    },
}

/// Build the viewer state for the current inputs
pub fn render_view(
    documents: &[Document],
    selected: Option<Uuid>,
    search_term: &str,
    ai_term: Option<&str>,
    config: &ViewerConfig,
) -> Result<DocumentView, HighlightError> {
    let Some(document) = select_active(documents, selected) else {
        return Ok(DocumentView::Empty);
    };

    let Some(content) = document.content() else {
        return Ok(DocumentView::Pending {
            document_id: document.id(),
            name: document.name().to_string(),
            status: document.status(),
        });
    };

    let highlighted = highlight(content, Some(search_term), ai_term, &config.highlight)?;

    Ok(DocumentView::Ready {
        document_id: document.id(),
        name: document.name().to_string(),
        stats: DocumentStats::with_page_size(Some(content), config.words_per_page),
        html: highlighted.html,
        search_matches: highlighted.search_matches,
        ai_matches: highlighted.ai_matches,
    })
}

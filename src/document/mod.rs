//! Document presentation
//!
//! Derived data for displaying the uploaded collection:
//! - Active document selection with first-document fallback
//! - Word, character and page statistics
//! - Viewer state with highlighted, escaped markup
//! - File size formatting for document cards

mod format;
mod stats;
mod view;

pub use format::format_file_size;
pub use stats::{DocumentStats, WORDS_PER_PAGE};
pub use view::{document_tabs, render_view, select_active, DocumentTab, DocumentView};

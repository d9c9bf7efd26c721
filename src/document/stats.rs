//! Derived document statistics

use serde::Serialize;

/// Approximate words on a printed page
pub const WORDS_PER_PAGE: usize = 250;

/// Word, character and page counts for a document body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Maximal whitespace-delimited tokens
    pub words: usize,
    /// UTF-16 code units, the length a browser reports
    pub chars: usize,
    pub pages: usize,
}

impl DocumentStats {
    /// Stats with the default page size. Absent content is all zeros.
    pub fn compute(content: Option<&str>) -> Self {
        Self::with_page_size(content, WORDS_PER_PAGE)
    }

    pub fn with_page_size(content: Option<&str>, words_per_page: usize) -> Self {
        let Some(content) = content else {
            return Self::default();
        };

        let words = content.split_whitespace().count();
        let chars = content.encode_utf16().count();
        let pages = words.div_ceil(words_per_page.max(1));

        Self { words, chars, pages }
    }
}

//! Highlight rendering for plain document text
//!
//! Document text is untrusted. It is HTML-escaped segment by segment and
//! only the marker elements produced here are emitted as markup. Terms are
//! matched as case-insensitive literals against the original text, never
//! against markup produced by an earlier pass.

use std::ops::Range;

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::RegexBuilder;

/// Configuration for highlight rendering
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    /// Element wrapped around each match
    pub element: String,
    /// Class for live search matches
    pub search_class: String,
    /// Class for externally supplied (AI) matches
    pub ai_class: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            element: "mark".to_string(),
            search_class: "bg-yellow-200 dark:bg-yellow-800".to_string(),
            ai_class: "bg-primary/20 border border-primary/40".to_string(),
        }
    }
}

/// Result of highlight rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightResult {
    /// Escaped text with marker elements
    pub html: String,
    /// Number of search term occurrences
    pub search_matches: usize,
    /// Number of AI term occurrences
    pub ai_matches: usize,
}

/// Errors during highlight rendering
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// Only reachable for terms beyond the matcher's size limit
    #[error("Cannot build matcher for term: {0}")]
    Matcher(#[from] regex::Error),
}

/// Render `content` with every occurrence of each term marked
///
/// Empty or absent terms mark nothing. Where a search match and an AI match
/// overlap, the AI element wraps the search element on the shared segment.
pub fn highlight(
    content: &str,
    search_term: Option<&str>,
    ai_term: Option<&str>,
    config: &HighlightConfig,
) -> Result<HighlightResult, HighlightError> {
    let search_spans = find_literal(content, search_term)?;
    let ai_spans = find_literal(content, ai_term)?;

    let mut result = HighlightResult {
        html: String::with_capacity(content.len()),
        search_matches: search_spans.len(),
        ai_matches: ai_spans.len(),
    };

    if search_spans.is_empty() && ai_spans.is_empty() {
        result.html.push_str(&encode_text(content));
        return Ok(result);
    }

    let mut boundaries: Vec<usize> = search_spans
        .iter()
        .chain(ai_spans.iter())
        .flat_map(|span| [span.start, span.end])
        .chain([0, content.len()])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let search_open = open_tag(config, &config.search_class);
    let ai_open = open_tag(config, &config.ai_class);
    let close = format!("</{}>", config.element);

    let mut search_cursor = 0;
    let mut ai_cursor = 0;

    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let in_search = covers(&search_spans, &mut search_cursor, start, end);
        let in_ai = covers(&ai_spans, &mut ai_cursor, start, end);
        let text = encode_text(&content[start..end]);

        let out = &mut result.html;
        if in_ai {
            out.push_str(&ai_open);
        }
        if in_search {
            out.push_str(&search_open);
        }
        out.push_str(&text);
        if in_search {
            out.push_str(&close);
        }
        if in_ai {
            out.push_str(&close);
        }
    }

    Ok(result)
}

/// Byte ranges of case-insensitive literal matches
fn find_literal(content: &str, term: Option<&str>) -> Result<Vec<Range<usize>>, HighlightError> {
    let term = match term {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(Vec::new()),
    };

    let matcher = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()?;

    Ok(matcher.find_iter(content).map(|m| m.range()).collect())
}

/// Whether `[start, end)` lies inside one of the sorted, disjoint `spans`.
/// Segments must be visited in order.
fn covers(spans: &[Range<usize>], cursor: &mut usize, start: usize, end: usize) -> bool {
    while *cursor < spans.len() && spans[*cursor].end <= start {
        *cursor += 1;
    }
    spans
        .get(*cursor)
        .map(|span| span.start <= start && end <= span.end)
        .unwrap_or(false)
}

fn open_tag(config: &HighlightConfig, class: &str) -> String {
    format!(
        "<{} class=\"{}\">",
        config.element,
        encode_double_quoted_attribute(class)
    )
}

//! HTML rendering module
//!
//! Turns untrusted document text into markup with highlighted spans.
//! Output contains only escaped text plus the marker elements.

mod highlighter;

pub use highlighter::{highlight, HighlightConfig, HighlightError, HighlightResult};

//! Positioned text extraction from PDF pages.
//!
//! Produces the word tokens that identifier matching and row grouping work on.

pub mod fonts;
pub mod text;

pub use fonts::FontInfo;
pub use text::{extract_page_tokens, TokenExtractor, SPACE_THRESHOLD, WORD_GAP_RATIO};

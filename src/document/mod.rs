//! Paginated documents the engine can read, annotate and re-assemble.
//!
//! The engine never touches a file format directly. It works through the
//! [`Document`] trait, which a backend implements once:
//!
//! - [`PdfDocument`] reads and writes real PDF files through `lopdf`;
//! - [`MemoryDocument`] holds pre-extracted tokens and writes JSON.

pub mod memory;
pub mod pdf;

pub use memory::{MemoryDocument, MemoryPage};
pub use pdf::PdfDocument;

use crate::config::HighlightStyle;
use crate::error::Result;
use crate::geometry::Rect;
use crate::search::PhraseSearcher;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// US Letter in points, used when a page has no usable media box.
pub const LETTER: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// A positioned run of text on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Text of the run, without surrounding whitespace
    pub text: String,
    /// Bounding box in page space
    pub bbox: Rect,
    /// Page the token was found on (0-based)
    pub page_index: usize,
}

impl Token {
    /// Create a token.
    pub fn new(text: impl Into<String>, bbox: Rect, page_index: usize) -> Self {
        Self {
            text: text.into(),
            bbox,
            page_index,
        }
    }
}

/// Read, annotate and assemble operations the engine needs from a document.
pub trait Document {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Visible area of a page in the same space as its tokens.
    fn page_bounds(&self, page_index: usize) -> Result<Rect>;

    /// Word tokens of a page, in content order.
    fn page_tokens(&self, page_index: usize) -> Result<Vec<Token>>;

    /// Rectangles of every literal occurrence of the searcher's phrase on a page.
    ///
    /// `tokens` are the page tokens the caller already extracted. The default
    /// implementation groups them into rows with `row_tolerance`, the same row
    /// rule row highlights use, and searches each row's text, so a phrase never
    /// spans two rows. A backend with its own phrase search may override this.
    fn search_phrase(
        &self,
        _page_index: usize,
        tokens: &[Token],
        searcher: &PhraseSearcher,
        row_tolerance: f32,
    ) -> Result<Vec<Rect>> {
        Ok(searcher.search_tokens(tokens, row_tolerance))
    }

    /// Attach a highlight to a page.
    fn add_highlight(&mut self, page_index: usize, rect: Rect, style: &HighlightStyle, label: &str) -> Result<()>;

    /// Write a new document made of the given pages, annotations included.
    ///
    /// Pages keep their source order. An empty selection produces a one-page
    /// placeholder document instead of failing.
    fn write_pages(&self, pages: &[usize], out: &mut dyn Write) -> Result<()>;
}

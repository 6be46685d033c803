//! In-memory document backed by pre-extracted tokens.
//!
//! Useful when a caller already holds a page layout from another extractor,
//! and for exercising the engine without real files. Output is JSON.

use crate::config::HighlightStyle;
use crate::document::{Document, Token, LETTER};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A highlight stored on a memory page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMark {
    /// Marked area
    pub rect: Rect,
    /// Popup text
    pub label: String,
    /// RGB color
    pub color: [f32; 3],
    /// Opacity
    pub opacity: f32,
}

/// One page of a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    /// Page area
    pub bounds: Rect,
    /// Tokens on the page
    pub tokens: Vec<Token>,
    /// Highlights added so far
    #[serde(default)]
    pub marks: Vec<MemoryMark>,
    /// Simulates a page whose text cannot be extracted
    #[serde(default)]
    pub unreadable: bool,
}

/// Serialized shape of an assembled memory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledPage {
    /// Index of the page in the source document, `None` for the placeholder
    pub source_index: Option<usize>,
    /// Page area
    pub bounds: Rect,
    /// Highlights on the page
    pub marks: Vec<MemoryMark>,
}

/// Document made of token lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page from `(text, bbox)` pairs and return its index.
    pub fn push_page<S: Into<String>>(&mut self, bounds: Rect, words: Vec<(S, Rect)>) -> usize {
        let page_index = self.pages.len();
        let tokens = words
            .into_iter()
            .map(|(text, bbox)| Token::new(text, bbox, page_index))
            .collect();
        self.pages.push(MemoryPage {
            bounds,
            tokens,
            marks: Vec::new(),
            unreadable: false,
        });
        page_index
    }

    /// Append a page whose token extraction always fails.
    pub fn push_unreadable_page(&mut self, bounds: Rect) -> usize {
        self.pages.push(MemoryPage {
            bounds,
            tokens: Vec::new(),
            marks: Vec::new(),
            unreadable: true,
        });
        self.pages.len() - 1
    }

    /// Build a document from JSON produced by serializing a `MemoryDocument`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: MemoryDocument = serde_json::from_str(json)?;
        // Token page indices always follow the page position.
        for (index, page) in doc.pages.iter_mut().enumerate() {
            for token in &mut page.tokens {
                token.page_index = index;
            }
        }
        Ok(doc)
    }

    /// Highlights added to a page so far.
    pub fn marks(&self, page_index: usize) -> &[MemoryMark] {
        self.pages
            .get(page_index)
            .map(|p| p.marks.as_slice())
            .unwrap_or(&[])
    }

    /// Assemble the chosen pages, or a blank placeholder when none are chosen.
    pub fn assemble(&self, pages: &[usize]) -> Result<Vec<AssembledPage>> {
        let mut selected = pages.to_vec();
        selected.sort_unstable();
        selected.dedup();

        if selected.is_empty() {
            let bounds = self.pages.first().map(|p| p.bounds).unwrap_or(LETTER);
            return Ok(vec![AssembledPage {
                source_index: None,
                bounds,
                marks: Vec::new(),
            }]);
        }

        selected
            .into_iter()
            .map(|index| {
                let page = self.page(index)?;
                Ok(AssembledPage {
                    source_index: Some(index),
                    bounds: page.bounds,
                    marks: page.marks.clone(),
                })
            })
            .collect()
    }

    fn page(&self, page_index: usize) -> Result<&MemoryPage> {
        self.pages.get(page_index).ok_or(Error::PageOutOfRange {
            index: page_index,
            count: self.pages.len(),
        })
    }
}

impl Document for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, page_index: usize) -> Result<Rect> {
        Ok(self.page(page_index)?.bounds)
    }

    fn page_tokens(&self, page_index: usize) -> Result<Vec<Token>> {
        let page = self.page(page_index)?;
        if page.unreadable {
            return Err(Error::MalformedInput(format!(
                "page {} has no extractable text layer",
                page_index
            )));
        }
        Ok(page.tokens.clone())
    }

    fn add_highlight(&mut self, page_index: usize, rect: Rect, style: &HighlightStyle, label: &str) -> Result<()> {
        let count = self.pages.len();
        let page = self.pages.get_mut(page_index).ok_or(Error::PageOutOfRange {
            index: page_index,
            count,
        })?;
        page.marks.push(MemoryMark {
            rect,
            label: label.to_string(),
            color: style.color,
            opacity: style.opacity,
        });
        Ok(())
    }

    fn write_pages(&self, pages: &[usize], out: &mut dyn Write) -> Result<()> {
        let assembled = self.assemble(pages)?;
        serde_json::to_writer_pretty(&mut *out, &assembled)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![("A100", Rect::new(10.0, 10.0, 40.0, 20.0))]);
        doc.push_page(Rect::new(0.0, 0.0, 595.0, 842.0), vec![("B200", Rect::new(10.0, 10.0, 40.0, 20.0))]);
        doc
    }

    #[test]
    fn test_tokens_carry_page_index() {
        let doc = sample();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_tokens(1).unwrap()[0].page_index, 1);
        assert!(matches!(doc.page_tokens(5), Err(Error::PageOutOfRange { index: 5, count: 2 })));
    }

    #[test]
    fn test_unreadable_page() {
        let mut doc = sample();
        let idx = doc.push_unreadable_page(LETTER);
        assert!(doc.page_tokens(idx).is_err());
        assert_eq!(doc.page_bounds(idx).unwrap(), LETTER);
    }

    #[test]
    fn test_write_selected_pages() {
        let mut doc = sample();
        let style = HighlightStyle::yellow();
        doc.add_highlight(1, Rect::new(10.0, 10.0, 40.0, 20.0), &style, "B200").unwrap();

        let mut out = Vec::new();
        doc.write_pages(&[1], &mut out).unwrap();
        let pages: Vec<AssembledPage> = serde_json::from_slice(&out).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source_index, Some(1));
        assert_eq!(pages[0].marks[0].label, "B200");
    }

    #[test]
    fn test_placeholder_when_nothing_selected() {
        let doc = sample();
        let pages = doc.assemble(&[]).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source_index, None);
        assert_eq!(pages[0].bounds, LETTER);
        assert!(MemoryDocument::new().assemble(&[]).unwrap()[0].marks.is_empty());
    }

    #[test]
    fn test_json_round_trip_fixes_page_indices() {
        let json = r#"{"pages":[
            {"bounds":{"x0":0,"y0":0,"x1":100,"y1":100},"tokens":[]},
            {"bounds":{"x0":0,"y0":0,"x1":100,"y1":100},
             "tokens":[{"text":"X1","bbox":{"x0":1,"y0":1,"x1":5,"y1":5},"page_index":0}]}
        ]}"#;
        let doc = MemoryDocument::from_json(json).unwrap();
        assert_eq!(doc.page_tokens(1).unwrap()[0].page_index, 1);
    }
}

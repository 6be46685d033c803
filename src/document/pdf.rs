//! PDF backend built on `lopdf`.
//!
//! Text is located by interpreting page content streams (see
//! [`crate::extractors`]). Highlights are real `/Highlight` annotations with an
//! appearance stream, so they render the same in every viewer.

use crate::annotations::HighlightMarkup;
use crate::config::HighlightStyle;
use crate::document::{Document, Token, LETTER};
use crate::error::{Error, Result};
use crate::extractors::extract_page_tokens;
use crate::geometry::Rect;
use lopdf::{dictionary, Object, ObjectId};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// A loaded PDF file.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    doc: lopdf::Document,
    pages: Vec<ObjectId>,
}

impl PdfDocument {
    /// Parse a PDF from memory.
    ///
    /// A buffer that is not a readable PDF is reported as malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| Error::MalformedInput(format!("cannot open document: {}", e)))?;
        Self::from_lopdf(doc)
    }

    /// Read and parse a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        log::info!("Opened {} ({} bytes)", path.as_ref().display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Wrap an already loaded `lopdf` document.
    pub fn from_lopdf(doc: lopdf::Document) -> Result<Self> {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(Error::MalformedInput("document has no pages".to_string()));
        }
        log::debug!("Document has {} pages", pages.len());
        Ok(Self { doc, pages })
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId> {
        self.pages
            .get(page_index)
            .copied()
            .ok_or(Error::PageOutOfRange {
                index: page_index,
                count: self.pages.len(),
            })
    }

    /// Media box of a page, following inheritance through the page tree.
    fn media_box(&self, page_id: ObjectId) -> Option<Rect> {
        let mut node = self.doc.get_dictionary(page_id).ok();
        let mut hops = 0;
        while let Some(dict) = node {
            if let Ok(obj) = dict.get(b"MediaBox") {
                let values: Vec<f32> = self
                    .doc
                    .dereference(obj)
                    .ok()
                    .and_then(|(_, o)| o.as_array().ok())
                    .map(|a| a.iter().filter_map(|v| v.as_float().ok()).collect())
                    .unwrap_or_default();
                if let [x0, y0, x1, y1] = values.as_slice() {
                    return Some(Rect::new(*x0, *y0, *x1, *y1));
                }
            }
            hops += 1;
            if hops > 64 {
                break;
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }
        None
    }

    fn append_annotation(&mut self, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
        let annots_ref = self
            .doc
            .get_dictionary(page_id)?
            .get(b"Annots")
            .and_then(Object::as_reference)
            .ok();
        if let Some(array_id) = annots_ref {
            self.doc
                .get_object_mut(array_id)?
                .as_array_mut()?
                .push(Object::Reference(annot_id));
            return Ok(());
        }

        let page = self.doc.get_dictionary_mut(page_id)?;
        match page.get_mut(b"Annots").and_then(Object::as_array_mut) {
            Ok(annots) => annots.push(Object::Reference(annot_id)),
            Err(_) => page.set("Annots", vec![Object::Reference(annot_id)]),
        }
        Ok(())
    }

    /// One blank page sized like `bounds`.
    fn placeholder(bounds: Rect) -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Real(bounds.x0),
                Object::Real(bounds.y0),
                Object::Real(bounds.x1),
                Object::Real(bounds.y1),
            ],
            "Resources" => dictionary! {},
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, page_index: usize) -> Result<Rect> {
        let page_id = self.page_id(page_index)?;
        Ok(self.media_box(page_id).unwrap_or(LETTER))
    }

    fn page_tokens(&self, page_index: usize) -> Result<Vec<Token>> {
        let page_id = self.page_id(page_index)?;
        extract_page_tokens(&self.doc, page_id, page_index)
    }

    fn add_highlight(&mut self, page_index: usize, rect: Rect, style: &HighlightStyle, label: &str) -> Result<()> {
        let page_id = self.page_id(page_index)?;
        let markup = HighlightMarkup::new(rect, style, label);
        let appearance_id = self.doc.add_object(markup.appearance_stream());
        let annot_id = self.doc.add_object(markup.annotation_dict(page_id, appearance_id));
        self.append_annotation(page_id, annot_id)
    }

    fn write_pages(&self, pages: &[usize], out: &mut dyn Write) -> Result<()> {
        for &index in pages {
            self.page_id(index)?;
        }

        let mut output = if pages.is_empty() {
            let bounds = self.page_bounds(0).unwrap_or(LETTER);
            log::info!("No pages retained, writing a blank placeholder page");
            Self::placeholder(bounds)
        } else {
            let keep: BTreeSet<usize> = pages.iter().copied().collect();
            let removed: Vec<u32> = (0..self.pages.len())
                .filter(|i| !keep.contains(i))
                .map(|i| i as u32 + 1)
                .collect();
            let mut copy = self.doc.clone();
            copy.delete_pages(&removed);
            let pruned = copy.prune_objects();
            log::debug!(
                "Kept {} of {} pages, pruned {} objects",
                keep.len(),
                self.pages.len(),
                pruned.len()
            );
            copy
        };

        let mut sink = out;
        output.save_to(&mut sink)?;
        sink.flush()?;
        Ok(())
    }
}

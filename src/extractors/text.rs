//! Positioned word extraction from PDF content streams.
//!
//! The extractor walks a page's content stream, tracks the text and graphics
//! state, and emits one [`Token`] per whitespace-delimited word with its
//! bounding box in PDF user space.
//!
//! Word boundaries come from three sources:
//! - a decoded whitespace glyph;
//! - a `TJ` adjustment more negative than the space threshold;
//! - a jump between the end of one glyph and the start of the next that is
//!   larger than a fraction of the font size (new `Td`/`Tm` positions).

use crate::content::{GraphicsStateStack, Matrix};
use crate::document::Token;
use crate::error::Result;
use crate::extractors::fonts::{fonts_from_resources, FontInfo};
use crate::geometry::{Point, Rect};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::rc::Rc;

/// `TJ` adjustment (thousandths of an em) below which a word break is assumed.
pub const SPACE_THRESHOLD: f32 = -120.0;

/// Glyph gap, as a fraction of the font size, that separates two words.
pub const WORD_GAP_RATIO: f32 = 0.2;

const MAX_FORM_DEPTH: usize = 8;

/// Fonts and XObjects visible to the stream being interpreted.
struct ResourceScope<'a> {
    fonts: HashMap<Vec<u8>, FontInfo<'a>>,
    xobjects: Vec<&'a Dictionary>,
    fallback: FontInfo<'a>,
}

impl<'a> ResourceScope<'a> {
    fn font(&self, name: Option<&[u8]>) -> &FontInfo<'a> {
        name.and_then(|n| self.fonts.get(n)).unwrap_or(&self.fallback)
    }

    fn xobject(&self, doc: &'a Document, name: &[u8]) -> Option<&'a lopdf::Stream> {
        self.xobjects
            .iter()
            .copied()
            .find_map(|dict: &'a Dictionary| dict.get_deref(name, doc).and_then(Object::as_stream).ok())
    }
}

/// Word being assembled from consecutive glyphs.
#[derive(Debug)]
struct PendingWord {
    text: String,
    bbox: Rect,
    pen: Point,
    size: f32,
}

/// Content stream interpreter producing word tokens.
pub struct TokenExtractor<'a> {
    doc: &'a Document,
    page_index: usize,
    stack: GraphicsStateStack,
    scope: Rc<ResourceScope<'a>>,
    word: Option<PendingWord>,
    tokens: Vec<Token>,
    depth: usize,
}

impl<'a> TokenExtractor<'a> {
    /// Create an extractor for one page of `doc`.
    pub fn for_page(doc: &'a Document, page_id: ObjectId, page_index: usize) -> Result<Self> {
        let fonts = doc
            .get_page_fonts(page_id)?
            .into_iter()
            .map(|(name, dict)| (name, FontInfo::from_dict(doc, dict)))
            .collect();

        let (own, inherited) = doc.get_page_resources(page_id)?;
        let mut xobjects = Vec::new();
        let resource_dicts = own
            .into_iter()
            .chain(inherited.into_iter().filter_map(|id| doc.get_dictionary(id).ok()));
        for resources in resource_dicts {
            if let Ok(dict) = resources.get_deref(b"XObject", doc).and_then(Object::as_dict) {
                xobjects.push(dict);
            }
        }

        Ok(Self {
            doc,
            page_index,
            stack: GraphicsStateStack::new(),
            scope: Rc::new(ResourceScope {
                fonts,
                xobjects,
                fallback: FontInfo::fallback(),
            }),
            word: None,
            tokens: Vec::new(),
            depth: 0,
        })
    }

    /// Interpret a decoded content stream and return the tokens in stream order.
    pub fn extract(mut self, content: &[u8]) -> Result<Vec<Token>> {
        let content = Content::decode(content)?;
        self.run(&content.operations);
        self.flush_word();
        Ok(self.tokens)
    }

    fn run(&mut self, operations: &[Operation]) {
        for op in operations {
            self.execute_operator(op);
        }
    }

    fn execute_operator(&mut self, op: &Operation) {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => self.stack.save(),
            "Q" => self.stack.restore(),
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    let state = self.stack.current_mut();
                    state.ctm = m.multiply(&state.ctm);
                }
            },

            "BT" => {
                self.stack.current_mut().set_text_matrix(Matrix::identity());
            },
            "ET" => {},

            // Text state
            "Tf" => {
                let state = self.stack.current_mut();
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    state.font_name = Some(name.to_vec());
                }
                if let Some(size) = number(operands, 1) {
                    state.font_size = size;
                }
            },
            "Tc" => {
                if let Some(v) = number(operands, 0) {
                    self.stack.current_mut().char_space = v;
                }
            },
            "Tw" => {
                if let Some(v) = number(operands, 0) {
                    self.stack.current_mut().word_space = v;
                }
            },
            "Tz" => {
                if let Some(v) = number(operands, 0) {
                    self.stack.current_mut().horizontal_scaling = v;
                }
            },
            "TL" => {
                if let Some(v) = number(operands, 0) {
                    self.stack.current_mut().leading = v;
                }
            },
            "Ts" => {
                if let Some(v) = number(operands, 0) {
                    self.stack.current_mut().text_rise = v;
                }
            },

            // Text positioning
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    self.stack.current_mut().move_text_position(tx, ty);
                }
            },
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(operands, 0), number(operands, 1)) {
                    let state = self.stack.current_mut();
                    state.leading = -ty;
                    state.move_text_position(tx, ty);
                }
            },
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.stack.current_mut().set_text_matrix(m);
                }
            },
            "T*" => self.stack.current_mut().next_line(),

            // Text showing
            "Tj" => {
                if let Some(Ok(bytes)) = operands.first().map(Object::as_str) {
                    self.show_text(bytes);
                }
            },
            "'" => {
                self.stack.current_mut().next_line();
                if let Some(Ok(bytes)) = operands.first().map(Object::as_str) {
                    self.show_text(bytes);
                }
            },
            "\"" => {
                if let (Some(aw), Some(ac)) = (number(operands, 0), number(operands, 1)) {
                    let state = self.stack.current_mut();
                    state.word_space = aw;
                    state.char_space = ac;
                }
                self.stack.current_mut().next_line();
                if let Some(Ok(bytes)) = operands.get(2).map(Object::as_str) {
                    self.show_text(bytes);
                }
            },
            "TJ" => {
                if let Some(Ok(array)) = operands.first().map(Object::as_array) {
                    self.process_tj_array(array);
                }
            },

            "Do" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    self.process_xobject(name);
                }
            },

            _ => {},
        }
    }

    fn process_tj_array(&mut self, array: &[Object]) {
        for element in array {
            match element {
                Object::String(bytes, _) => self.show_text(bytes),
                other => {
                    let Ok(offset) = other.as_float() else {
                        continue;
                    };
                    if offset < SPACE_THRESHOLD {
                        self.flush_word();
                    }
                    let state = self.stack.current_mut();
                    let tx = -offset / 1000.0 * state.font_size * state.horizontal_scaling / 100.0;
                    state.advance(tx);
                },
            }
        }
    }

    fn process_xobject(&mut self, name: &[u8]) {
        if self.depth >= MAX_FORM_DEPTH {
            log::warn!("Form XObject nesting deeper than {}, skipping", MAX_FORM_DEPTH);
            return;
        }
        let doc = self.doc;
        let Some(stream) = self.scope.xobject(doc, name) else {
            return;
        };
        if !matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Form")) {
            return;
        }
        let operations = match stream
            .get_plain_content()
            .and_then(|bytes| Content::decode(&bytes))
        {
            Ok(content) => content.operations,
            Err(e) => {
                log::debug!("Unreadable form XObject {}: {}", String::from_utf8_lossy(name), e);
                return;
            },
        };
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|a| matrix_operand(a))
            .unwrap_or_default();

        let parent_scope = Rc::clone(&self.scope);
        if let Ok(resources) = stream.dict.get_deref(b"Resources", doc).and_then(Object::as_dict) {
            let mut xobjects = Vec::new();
            if let Ok(dict) = resources.get_deref(b"XObject", doc).and_then(Object::as_dict) {
                xobjects.push(dict);
            }
            self.scope = Rc::new(ResourceScope {
                fonts: fonts_from_resources(doc, resources),
                xobjects,
                fallback: FontInfo::fallback(),
            });
        }

        self.stack.save();
        {
            let state = self.stack.current_mut();
            state.ctm = form_matrix.multiply(&state.ctm);
        }
        self.depth += 1;
        self.run(&operations);
        self.depth -= 1;
        self.stack.restore();
        self.scope = parent_scope;
    }

    fn show_text(&mut self, bytes: &[u8]) {
        let scope = Rc::clone(&self.scope);
        let font = scope.font(self.stack.current().font_name.as_deref());

        for code in font.codes(bytes) {
            let text = font.decode(code);
            let w0 = font.glyph_width(FontInfo::code_value(code)) / 1000.0;

            let state = self.stack.current();
            let glyph_space = state.glyph_matrix();
            let glyph_box = glyph_space.transform_rect(&Rect {
                x0: 0.0,
                y0: font.descent() / 1000.0,
                x1: w0,
                y1: font.ascent() / 1000.0,
            });
            let origin = glyph_space.transform_point(0.0, 0.0);
            let size = glyph_space.vertical_scale();

            // Tx = (w0 * Tfs + Tc + Tw) * Th
            let mut tx = w0 * state.font_size + state.char_space;
            if font.is_word_space(code) {
                tx += state.word_space;
            }
            tx *= state.horizontal_scaling / 100.0;
            self.stack.current_mut().advance(tx);
            let pen = self.stack.current().glyph_matrix().transform_point(0.0, 0.0);

            self.push_glyph(&text, glyph_box, origin, pen, size);
        }
    }

    fn push_glyph(&mut self, text: &str, bbox: Rect, origin: Point, pen: Point, size: f32) {
        if text.is_empty() {
            return;
        }
        if text.chars().all(char::is_whitespace) {
            self.flush_word();
            return;
        }

        if let Some(word) = &self.word {
            let gap = (origin.x - word.pen.x).hypot(origin.y - word.pen.y);
            if gap > WORD_GAP_RATIO * size.max(word.size) {
                self.flush_word();
            }
        }

        let visible: String = text.chars().filter(|c| !c.is_control()).collect();
        match &mut self.word {
            Some(word) => {
                word.text.push_str(&visible);
                word.bbox = word.bbox.union(&bbox);
                word.pen = pen;
                word.size = size;
            },
            None => {
                self.word = Some(PendingWord {
                    text: visible,
                    bbox,
                    pen,
                    size,
                });
            },
        }
    }

    fn flush_word(&mut self) {
        if let Some(word) = self.word.take() {
            let text = word.text.trim();
            if !text.is_empty() {
                self.tokens.push(Token::new(text, word.bbox, self.page_index));
            }
        }
    }
}

/// Extract the word tokens of one page.
pub fn extract_page_tokens(doc: &Document, page_id: ObjectId, page_index: usize) -> Result<Vec<Token>> {
    let content = doc.get_page_content(page_id)?;
    let tokens = TokenExtractor::for_page(doc, page_id, page_index)?.extract(&content)?;
    log::debug!("Page {}: extracted {} tokens", page_index, tokens.len());
    Ok(tokens)
}

fn number(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|o| o.as_float().ok())
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    Some(Matrix::new(
        number(operands, 0)?,
        number(operands, 1)?,
        number(operands, 2)?,
        number(operands, 3)?,
        number(operands, 4)?,
        number(operands, 5)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// One-page document whose page uses Helvetica as /F1 and the given content.
    fn single_page(content: &[u8]) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_extract_simple_words() {
        let (doc, page) = single_page(b"BT /F1 12 Tf 72 720 Td (EMP001 Alice Smith) Tj ET");
        let tokens = extract_page_tokens(&doc, page, 0).unwrap();
        assert_eq!(texts(&tokens), vec!["EMP001", "Alice", "Smith"]);
        assert!(tokens.iter().all(|t| t.page_index == 0));

        let first = &tokens[0];
        // 6 glyphs at the 500 default width and 12pt
        assert!((first.bbox.x0 - 72.0).abs() < 0.01);
        assert!((first.bbox.x1 - 108.0).abs() < 0.01);
        assert!(first.bbox.y0 < 720.0 && first.bbox.y1 > 720.0);
        assert!(tokens[1].bbox.x0 > first.bbox.x1);
    }

    #[test]
    fn test_td_starts_new_word() {
        let (doc, page) = single_page(b"BT /F1 10 Tf 72 700 Td (A100) Tj 100 0 Td (B200) Tj 0 -20 Td (C300) Tj ET");
        let tokens = extract_page_tokens(&doc, page, 3).unwrap();
        assert_eq!(texts(&tokens), vec!["A100", "B200", "C300"]);
        assert!(tokens[2].bbox.y1 < tokens[0].bbox.y0);
        assert_eq!(tokens[2].page_index, 3);
    }

    #[test]
    fn test_tj_offsets() {
        let (doc, page) = single_page(b"BT /F1 10 Tf 72 700 Td [(EMP) -20 (001) -250 (X9)] TJ ET");
        let tokens = extract_page_tokens(&doc, page, 0).unwrap();
        assert_eq!(texts(&tokens), vec!["EMP001", "X9"]);
    }

    #[test]
    fn test_adjacent_show_operators_join() {
        let (doc, page) = single_page(b"BT /F1 10 Tf 72 700 Td (ID-) Tj (42) Tj ET");
        let tokens = extract_page_tokens(&doc, page, 0).unwrap();
        assert_eq!(texts(&tokens), vec!["ID-42"]);
    }

    #[test]
    fn test_ctm_is_applied() {
        let (doc, page) = single_page(b"q 1 0 0 1 0 100 cm BT /F1 10 Tf 50 50 Td (X) Tj ET Q");
        let tokens = extract_page_tokens(&doc, page, 0).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!((tokens[0].bbox.x0 - 50.0).abs() < 0.01);
        assert!(tokens[0].bbox.y0 > 140.0 && tokens[0].bbox.y1 < 160.0);
    }

    #[test]
    fn test_empty_page_yields_no_tokens() {
        let (doc, page) = single_page(b"");
        assert!(extract_page_tokens(&doc, page, 0).unwrap().is_empty());
    }

    #[test]
    fn test_missing_font_resource_uses_fallback() {
        let (doc, page) = single_page(b"BT /F9 10 Tf 10 10 Td (Z1) Tj ET");
        let tokens = extract_page_tokens(&doc, page, 0).unwrap();
        assert_eq!(texts(&tokens), vec!["Z1"]);
    }
}

//! Font metrics and code decoding for token extraction.
//!
//! A [`FontInfo`] knows three things about a font resource: how many bytes make
//! up one character code, how wide each code is, and which Unicode text it
//! stands for. Everything else about the font is irrelevant to locating words.

use lopdf::{Dictionary, Document, Encoding, Object};
use std::collections::HashMap;

/// Glyph width used when a font carries no width information at all.
pub const DEFAULT_GLYPH_WIDTH: f32 = 500.0;

const DEFAULT_ASCENT: f32 = 800.0;
const DEFAULT_DESCENT: f32 = -200.0;

/// Widths in glyph space (1/1000 em).
#[derive(Debug, Clone, PartialEq)]
enum GlyphWidths {
    /// Simple font: `/FirstChar` + `/Widths`, falling back to `/MissingWidth`.
    Simple {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    /// CID font: sparse `/W` entries with `/DW` default.
    Cid {
        widths: HashMap<u32, f32>,
        default: f32,
    },
}

/// Decoding and metric information for one font resource.
pub struct FontInfo<'a> {
    encoding: Option<Encoding<'a>>,
    two_byte: bool,
    widths: GlyphWidths,
    ascent: f32,
    descent: f32,
}

impl std::fmt::Debug for FontInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontInfo")
            .field("encoding", &self.encoding)
            .field("two_byte", &self.two_byte)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .finish()
    }
}

impl Default for FontInfo<'_> {
    fn default() -> Self {
        Self::fallback()
    }
}

impl<'a> FontInfo<'a> {
    /// Font used when a `Tf` names a resource that does not exist.
    ///
    /// Single-byte codes, Latin-1 text and a flat half-em width.
    pub fn fallback() -> Self {
        Self {
            encoding: None,
            two_byte: false,
            widths: GlyphWidths::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing: DEFAULT_GLYPH_WIDTH,
            },
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }

    /// Read a font dictionary.
    ///
    /// Never fails: anything unreadable degrades to the fallback behavior for
    /// that aspect, and the problem is logged.
    pub fn from_dict(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let two_byte = matches!(
            dict.get(b"Subtype").and_then(Object::as_name),
            Ok(b"Type0")
        );

        let encoding = match dict.get_font_encoding(doc) {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                log::debug!("Font encoding unavailable, using raw codes: {}", e);
                None
            },
        };

        let descendant = if two_byte {
            dict.get_deref(b"DescendantFonts", doc)
                .and_then(Object::as_array)
                .ok()
                .and_then(|kids| kids.first())
                .and_then(|kid| doc.dereference(kid).ok())
                .and_then(|(_, obj)| obj.as_dict().ok())
        } else {
            None
        };

        let widths = match descendant {
            Some(cid_font) => read_cid_widths(doc, cid_font),
            None if two_byte => GlyphWidths::Cid {
                widths: HashMap::new(),
                default: 1000.0,
            },
            None => read_simple_widths(doc, dict),
        };

        let descriptor = descendant
            .unwrap_or(dict)
            .get_deref(b"FontDescriptor", doc)
            .and_then(Object::as_dict)
            .ok();
        let ascent = descriptor
            .and_then(|d| number(doc, d, b"Ascent"))
            .filter(|a| *a > 0.0)
            .unwrap_or(DEFAULT_ASCENT);
        let descent = descriptor
            .and_then(|d| number(doc, d, b"Descent"))
            .filter(|d| *d < 0.0)
            .unwrap_or(DEFAULT_DESCENT);

        Self {
            encoding,
            two_byte,
            widths,
            ascent,
            descent,
        }
    }

    /// Split a shown string into character codes.
    pub fn codes<'s>(&self, bytes: &'s [u8]) -> std::slice::Chunks<'s, u8> {
        bytes.chunks(if self.two_byte { 2 } else { 1 })
    }

    /// Numeric value of a code as returned by [`FontInfo::codes`].
    pub fn code_value(code: &[u8]) -> u32 {
        code.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
    }

    /// True when the code is the single-byte space that word spacing applies to.
    pub fn is_word_space(&self, code: &[u8]) -> bool {
        !self.two_byte && code == [0x20]
    }

    /// Width of a code in glyph space (1/1000 em).
    pub fn glyph_width(&self, code: u32) -> f32 {
        match &self.widths {
            GlyphWidths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            GlyphWidths::Cid { widths, default } => widths.get(&code).copied().unwrap_or(*default),
        }
    }

    /// Unicode text for one code.
    pub fn decode(&self, code: &[u8]) -> String {
        if let Some(encoding) = &self.encoding {
            if let Ok(text) = Document::decode_text(encoding, code) {
                return text;
            }
        }
        if self.two_byte {
            char::from_u32(Self::code_value(code))
                .map(|c| c.to_string())
                .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string())
        } else {
            code.iter().map(|&b| b as char).collect()
        }
    }

    /// Ascender in glyph space.
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Descender in glyph space (negative).
    pub fn descent(&self) -> f32 {
        self.descent
    }
}

/// Load every font of a resource dictionary, keyed by resource name.
pub fn fonts_from_resources<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
) -> HashMap<Vec<u8>, FontInfo<'a>> {
    let mut fonts = HashMap::new();
    let Ok(font_dict) = resources.get_deref(b"Font", doc).and_then(Object::as_dict) else {
        return fonts;
    };
    for (name, value) in font_dict.iter() {
        match doc.dereference(value).and_then(|(_, obj)| obj.as_dict()) {
            Ok(dict) => {
                fonts.insert(name.clone(), FontInfo::from_dict(doc, dict));
            },
            Err(e) => log::debug!("Skipping font {}: {}", String::from_utf8_lossy(name), e),
        }
    }
    fonts
}

fn number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    dict.get_deref(key, doc).and_then(Object::as_float).ok()
}

fn read_simple_widths(doc: &Document, dict: &Dictionary) -> GlyphWidths {
    let first_char = dict
        .get_deref(b"FirstChar", doc)
        .and_then(Object::as_i64)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    let widths = dict
        .get_deref(b"Widths", doc)
        .and_then(Object::as_array)
        .map(|array| {
            array
                .iter()
                .map(|w| {
                    doc.dereference(w)
                        .and_then(|(_, o)| o.as_float())
                        .unwrap_or(DEFAULT_GLYPH_WIDTH)
                })
                .collect()
        })
        .unwrap_or_default();
    let missing = dict
        .get_deref(b"FontDescriptor", doc)
        .and_then(Object::as_dict)
        .ok()
        .and_then(|d| number(doc, d, b"MissingWidth"))
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_GLYPH_WIDTH);
    GlyphWidths::Simple {
        first_char,
        widths,
        missing,
    }
}

/// Parse a CID font `/W` array.
///
/// Two entry forms are allowed: `c [w1 w2 ...]` assigns consecutive codes
/// starting at `c`, and `c_first c_last w` assigns one width to a range.
fn read_cid_widths(doc: &Document, cid_font: &Dictionary) -> GlyphWidths {
    let default = number(doc, cid_font, b"DW").unwrap_or(1000.0);
    let mut widths = HashMap::new();
    let Ok(entries) = cid_font.get_deref(b"W", doc).and_then(Object::as_array) else {
        return GlyphWidths::Cid { widths, default };
    };

    let resolve = |obj: &Object| doc.dereference(obj).map(|(_, o)| o.clone()).ok();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = resolve(&entries[i]).and_then(|o| o.as_i64().ok()) else {
            break;
        };
        let first = first.max(0) as u32;
        match entries.get(i + 1).and_then(resolve) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = resolve(w).and_then(|o| o.as_float().ok()) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            },
            Some(last) => {
                let Ok(last) = last.as_i64() else { break };
                let w = entries
                    .get(i + 2)
                    .and_then(resolve)
                    .and_then(|o| o.as_float().ok())
                    .unwrap_or(default);
                // Guard against absurd ranges in broken files.
                let last = (last.max(0) as u32).min(first.saturating_add(0xFFFF));
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            },
            None => break,
        }
    }
    GlyphWidths::Cid { widths, default }
}

//! Highlight annotations and their PDF representation.
//!
//! [`HighlightAnnotation`] is the backend-neutral record of one resolved mark.
//! [`HighlightMarkup`] turns a rectangle and a [`HighlightStyle`] into the
//! `/Highlight` annotation dictionary and its appearance stream.

use crate::config::HighlightStyle;
use crate::geometry::Rect;
use crate::search::MatchKind;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

/// One resolved mark on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightAnnotation {
    /// Page the mark belongs to (0-based)
    pub page_index: usize,
    /// Area to mark
    pub rect: Rect,
    /// Matched text (identifier or phrase)
    pub label: String,
    /// What produced the mark
    pub kind: MatchKind,
}

/// Annotation flags (`/F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnnotationFlags(u32);

impl AnnotationFlags {
    /// Hidden flag (bit 2) - do not display or print.
    pub const HIDDEN: u32 = 1 << 1;
    /// Print flag (bit 3) - print the annotation with the page.
    pub const PRINT: u32 = 1 << 2;
    /// ReadOnly flag (bit 7) - no interaction.
    pub const READ_ONLY: u32 = 1 << 6;

    /// Create new flags from raw value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Flags for a mark that shows up on paper too.
    pub fn printable() -> Self {
        Self(Self::PRINT)
    }

    /// Get raw value.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Check if the print flag is set.
    pub fn is_printable(&self) -> bool {
        self.0 & Self::PRINT != 0
    }
}

/// Name of the graphics state used inside highlight appearances.
const GSTATE_NAME: &str = "GS0";

/// PDF form of a single highlight.
#[derive(Debug, Clone)]
pub struct HighlightMarkup<'a> {
    rect: Rect,
    style: &'a HighlightStyle,
    contents: &'a str,
    flags: AnnotationFlags,
}

impl<'a> HighlightMarkup<'a> {
    /// Highlight covering `rect` with the given style and popup text.
    pub fn new(rect: Rect, style: &'a HighlightStyle, contents: &'a str) -> Self {
        Self {
            rect,
            style,
            contents,
            flags: AnnotationFlags::printable(),
        }
    }

    /// Override the annotation flags.
    pub fn with_flags(mut self, flags: AnnotationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Content stream of the normal appearance.
    ///
    /// Fills the rectangle with the style color under a multiply blend so the
    /// text underneath stays readable.
    pub fn appearance_content(&self) -> Vec<u8> {
        let [r, g, b] = self.style.color;
        let r_ = &self.rect;
        format!(
            "q\n/{} gs\n{} {} {} rg\n{} {} {} {} re\nf\nQ\n",
            GSTATE_NAME,
            r,
            g,
            b,
            r_.x0,
            r_.y0,
            r_.width(),
            r_.height()
        )
        .into_bytes()
    }

    /// Form XObject for the `/AP /N` entry.
    pub fn appearance_stream(&self) -> Stream {
        let opacity = self.style.opacity;
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => rect_array(&self.rect),
            "Resources" => dictionary! {
                "ExtGState" => dictionary! {
                    GSTATE_NAME => dictionary! {
                        "Type" => "ExtGState",
                        "CA" => opacity,
                        "ca" => opacity,
                        "BM" => "Multiply",
                    },
                },
            },
        };
        Stream::new(dict, self.appearance_content())
    }

    /// Annotation dictionary pointing at its page and appearance stream.
    pub fn annotation_dict(&self, page_id: ObjectId, appearance_id: ObjectId) -> Dictionary {
        let color: Vec<Object> = self.style.color.iter().map(|c| Object::Real(*c)).collect();
        let quads: Vec<Object> = self
            .rect
            .quad_points()
            .iter()
            .map(|v| Object::Real(*v))
            .collect();
        dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
            "Rect" => rect_array(&self.rect),
            "QuadPoints" => quads,
            "C" => color,
            "CA" => self.style.opacity,
            "F" => self.flags.bits() as i64,
            "P" => page_id,
            "Contents" => lopdf::text_string(self.contents),
            "AP" => dictionary! { "N" => appearance_id },
        }
    }
}

fn rect_array(rect: &Rect) -> Vec<Object> {
    vec![
        Object::Real(rect.x0),
        Object::Real(rect.y0),
        Object::Real(rect.x1),
        Object::Real(rect.y1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_flags() {
        let flags = AnnotationFlags::printable();
        assert!(flags.is_printable());
        assert_eq!(flags.bits(), 4);
        assert!(!AnnotationFlags::new(AnnotationFlags::HIDDEN).is_printable());
    }

    #[test]
    fn test_appearance_content() {
        let style = HighlightStyle::yellow();
        let markup = HighlightMarkup::new(Rect::new(10.0, 20.0, 110.0, 32.0), &style, "EMP001");
        let content = String::from_utf8(markup.appearance_content()).unwrap();
        assert!(content.contains("/GS0 gs"));
        assert!(content.contains("1 1 0 rg"));
        assert!(content.contains("10 20 100 12 re"));
    }

    #[test]
    fn test_appearance_stream_has_blend_state() {
        let style = HighlightStyle::yellow().with_opacity(0.5);
        let markup = HighlightMarkup::new(Rect::new(0.0, 0.0, 50.0, 10.0), &style, "x");
        let stream = markup.appearance_stream();
        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
        let gs = stream
            .dict
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"ExtGState"))
            .and_then(Object::as_dict)
            .and_then(|g| g.get(b"GS0"))
            .and_then(Object::as_dict)
            .unwrap();
        assert_eq!(gs.get(b"BM").unwrap().as_name().unwrap(), b"Multiply");
        assert_eq!(gs.get(b"ca").unwrap().as_float().unwrap(), 0.5);
    }

    #[test]
    fn test_annotation_dict() {
        let style = HighlightStyle::yellow();
        let markup = HighlightMarkup::new(Rect::new(72.0, 720.0, 172.0, 732.0), &style, "B200");
        let dict = markup.annotation_dict((4, 0), (9, 0));
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Highlight");
        assert_eq!(dict.get(b"F").unwrap().as_i64().unwrap(), 4);
        assert_eq!(dict.get(b"P").unwrap().as_reference().unwrap(), (4, 0));
        assert_eq!(dict.get(b"QuadPoints").unwrap().as_array().unwrap().len(), 8);
        assert_eq!(
            lopdf::decode_text_string(dict.get(b"Contents").unwrap()).unwrap(),
            "B200"
        );
        let ap = dict.get(b"AP").and_then(Object::as_dict).unwrap();
        assert_eq!(ap.get(b"N").unwrap().as_reference().unwrap(), (9, 0));
    }
}

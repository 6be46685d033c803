//! Exact identifier matching against page tokens.
//!
//! A token matches an identifier only when its trimmed text is equal to it.
//! Identifiers split over two tokens by the PDF producer are not found and end
//! up in the unmatched list.

use crate::document::Token;
use crate::geometry::Rect;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Origin of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Token equal to a loaded identifier
    Identifier,
    /// Occurrence of a configured structural phrase
    FixedPhrase,
}

/// One occurrence found on a page, before its highlight extent is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Identifier or phrase that matched
    pub identifier: String,
    /// Page of the occurrence (0-based)
    pub page_index: usize,
    /// Box of the matched token, or of the whole phrase
    pub token_bbox: Rect,
    /// What kind of match this is
    pub kind: MatchKind,
}

impl MatchRecord {
    /// Record for a token that equals an identifier.
    pub fn identifier(identifier: impl Into<String>, page_index: usize, token_bbox: Rect) -> Self {
        Self {
            identifier: identifier.into(),
            page_index,
            token_bbox,
            kind: MatchKind::Identifier,
        }
    }

    /// Record for a fixed phrase occurrence.
    pub fn phrase(phrase: impl Into<String>, page_index: usize, bbox: Rect) -> Self {
        Self {
            identifier: phrase.into(),
            page_index,
            token_bbox: bbox,
            kind: MatchKind::FixedPhrase,
        }
    }
}

/// Lookup structure over the distinct identifiers of a run.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceMatcher {
    identifiers: IndexSet<String>,
}

impl OccurrenceMatcher {
    /// Build a matcher. Duplicates collapse; blank identifiers are ignored.
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identifiers = identifiers
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { identifiers }
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// True when there is nothing to look for.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Identifier equal to `text` after trimming, if any.
    pub fn lookup(&self, text: &str) -> Option<&str> {
        self.identifiers.get(text.trim()).map(String::as_str)
    }

    /// Every identifier occurrence among a page's tokens, in token order.
    pub fn match_tokens(&self, tokens: &[Token]) -> Vec<MatchRecord> {
        if self.is_empty() {
            return Vec::new();
        }
        tokens
            .iter()
            .filter_map(|token| {
                self.lookup(&token.text)
                    .map(|id| MatchRecord::identifier(id, token.page_index, token.bbox))
            })
            .collect()
    }
}

//! Highlight extent policies and region resolution.

use crate::annotations::HighlightAnnotation;
use crate::config::RowOptions;
use crate::document::Token;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::RowGrouper;
use crate::search::{MatchKind, MatchRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far a highlight extends around a matched token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPolicy {
    /// Mark only the matched token.
    #[default]
    TokenBound,
    /// Mark the whole text row the token sits on.
    RowBound,
}

impl HighlightPolicy {
    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightPolicy::TokenBound => "token_bound",
            HighlightPolicy::RowBound => "row_bound",
        }
    }
}

impl fmt::Display for HighlightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "token" | "token_bound" => Ok(HighlightPolicy::TokenBound),
            "row" | "row_bound" => Ok(HighlightPolicy::RowBound),
            other => Err(Error::InvalidConfig(format!(
                "unknown highlight policy '{}', expected 'token' or 'row'",
                other
            ))),
        }
    }
}

/// Turns match records into highlight annotations for one page.
pub struct RegionResolver<'t> {
    policy: HighlightPolicy,
    rows: RowGrouper<'t>,
}

impl<'t> RegionResolver<'t> {
    /// Resolver for a page with the given tokens and bounds.
    pub fn new(policy: HighlightPolicy, tokens: &'t [Token], page: Rect, rows: RowOptions) -> Self {
        Self {
            policy,
            rows: RowGrouper::new(tokens, page, rows),
        }
    }

    /// Rectangle to mark for a record.
    pub fn region(&self, record: &MatchRecord) -> Rect {
        match (record.kind, self.policy) {
            (MatchKind::FixedPhrase, _) => record.token_bbox,
            (MatchKind::Identifier, HighlightPolicy::TokenBound) => record.token_bbox,
            (MatchKind::Identifier, HighlightPolicy::RowBound) => self.rows.row_rect(&record.token_bbox),
        }
    }

    /// Annotation for a record.
    pub fn resolve(&self, record: &MatchRecord) -> HighlightAnnotation {
        HighlightAnnotation {
            page_index: record.page_index,
            rect: self.region(record),
            label: record.identifier.clone(),
            kind: record.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LETTER;

    fn page_tokens() -> Vec<Token> {
        vec![
            Token::new("Label", Rect::new(20.0, 700.0, 60.0, 712.0), 1),
            Token::new("X1", Rect::new(100.0, 700.5, 115.0, 711.5), 1),
            Token::new("X1", Rect::new(300.0, 700.5, 315.0, 711.5), 1),
        ]
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("token".parse::<HighlightPolicy>().unwrap(), HighlightPolicy::TokenBound);
        assert_eq!("Row".parse::<HighlightPolicy>().unwrap(), HighlightPolicy::RowBound);
        assert_eq!("row-bound".parse::<HighlightPolicy>().unwrap(), HighlightPolicy::RowBound);
        assert!(matches!("paragraph".parse::<HighlightPolicy>(), Err(Error::InvalidConfig(_))));
        assert!("".parse::<HighlightPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trip() {
        for policy in [HighlightPolicy::TokenBound, HighlightPolicy::RowBound] {
            assert_eq!(policy.to_string().parse::<HighlightPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_token_bound_uses_token_box() {
        let tokens = page_tokens();
        let resolver = RegionResolver::new(HighlightPolicy::TokenBound, &tokens, LETTER, RowOptions::default());
        let record = MatchRecord::identifier("X1", 1, tokens[1].bbox);
        let annot = resolver.resolve(&record);
        assert_eq!(annot.rect, tokens[1].bbox);
        assert_eq!(annot.label, "X1");
        assert_eq!(annot.page_index, 1);
    }

    #[test]
    fn test_row_bound_spans_row() {
        let tokens = page_tokens();
        let resolver = RegionResolver::new(HighlightPolicy::RowBound, &tokens, LETTER, RowOptions::default());
        for token in &tokens[1..] {
            let rect = resolver.region(&MatchRecord::identifier("X1", 1, token.bbox));
            assert_eq!(rect, Rect::new(20.0, 700.0, 315.0, 712.0));
            assert!(rect.contains(&token.bbox));
        }
    }

    #[test]
    fn test_phrase_keeps_its_rect() {
        let tokens = page_tokens();
        let resolver = RegionResolver::new(HighlightPolicy::RowBound, &tokens, LETTER, RowOptions::default());
        let phrase = Rect::new(20.0, 700.0, 115.0, 712.0);
        let annot = resolver.resolve(&MatchRecord::phrase("Label X1", 1, phrase));
        assert_eq!(annot.rect, phrase);
        assert_eq!(annot.kind, MatchKind::FixedPhrase);
    }
}

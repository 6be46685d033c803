//! Literal phrase search over row-assembled page text.
//!
//! Each row's tokens are joined with single spaces while remembering where
//! every token starts and ends. A hit is reported as the union of the boxes of
//! the tokens it touches.

use crate::document::Token;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::group_rows;
use regex::{Regex, RegexBuilder};

/// Compiled search for one literal phrase.
#[derive(Debug, Clone)]
pub struct PhraseSearcher {
    phrase: String,
    regex: Regex,
}

impl PhraseSearcher {
    /// Compile a phrase. Internal whitespace matches any run of whitespace.
    pub fn new(phrase: &str, case_insensitive: bool) -> Result<Self> {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            return Err(Error::InvalidConfig("search phrase is blank".to_string()));
        }
        let regex = RegexBuilder::new(&words.join(r"\s+"))
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("invalid search phrase: {}", e)))?;
        Ok(Self {
            phrase: phrase.trim().to_string(),
            regex,
        })
    }

    /// The phrase as configured, without surrounding whitespace.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Rectangles of every occurrence, rows top to bottom.
    pub fn search_tokens(&self, tokens: &[Token], row_tolerance: f32) -> Vec<Rect> {
        let mut results = Vec::new();
        for row in group_rows(tokens, row_tolerance) {
            let row: Vec<&Token> = row.iter().map(|&i| &tokens[i]).collect();
            let (text, positions) = build_text_with_positions(&row);
            for mat in self.regex.find_iter(&text) {
                if let Some(bbox) = compute_match_bbox(mat.start(), mat.end(), &row, &positions) {
                    results.push(bbox);
                }
            }
        }
        results
    }
}

/// Joined row text and `(start, end, token_index)` for each token.
fn build_text_with_positions(row: &[&Token]) -> (String, Vec<(usize, usize, usize)>) {
    let mut text = String::new();
    let mut positions = Vec::with_capacity(row.len());
    for (idx, token) in row.iter().enumerate() {
        if idx > 0 {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(&token.text);
        positions.push((start, text.len(), idx));
    }
    (text, positions)
}

fn compute_match_bbox(
    match_start: usize,
    match_end: usize,
    row: &[&Token],
    positions: &[(usize, usize, usize)],
) -> Option<Rect> {
    let touched: Vec<Rect> = positions
        .iter()
        .filter(|&&(start, end, _)| start < match_end && end > match_start)
        .map(|&(_, _, idx)| row[idx].bbox)
        .collect();
    Rect::union_all(&touched)
}

//! Outcome of a matching run.

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

/// Ways a run can come back empty without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResult {
    /// No page produced a highlight; the output is a placeholder page
    NoPagesRetained,
    /// The identifier source held no usable values
    NoIdentifiers,
    /// Identifiers were loaded but none occurs in the document
    NoMatches,
}

impl fmt::Display for EmptyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoPagesRetained => "no pages retained; output will contain a placeholder page only",
            Self::NoIdentifiers => "no identifiers to match",
            Self::NoMatches => "none of the identifiers occur in the document",
        };
        f.write_str(text)
    }
}

/// What happened on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutcome {
    /// Page index (0-based)
    pub page_index: usize,
    /// True when the page produced at least one highlight annotation
    pub had_any_highlight: bool,
    /// Highlights applied to the page
    pub highlight_count: usize,
    /// True when the page could not be read and was treated as empty
    pub extraction_failed: bool,
}

/// Result of running the engine over a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Retained pages, in source order
    pub output_pages: Vec<usize>,
    /// Identifiers found anywhere, in order of first discovery
    pub found_identifiers: IndexSet<String>,
    /// Loaded identifiers never found, in load order
    pub unmatched_identifiers: Vec<String>,
    /// Highlights applied across the whole document
    pub total_highlights: usize,
    /// One entry per page, in source order
    pub page_outcomes: Vec<PageOutcome>,
}

impl RunResult {
    /// True when no page was retained.
    pub fn is_empty(&self) -> bool {
        self.output_pages.is_empty()
    }

    /// Every reason this result counts as empty, in a fixed order.
    pub fn empty_reasons(&self) -> Vec<EmptyResult> {
        let mut reasons = Vec::new();
        if self.output_pages.is_empty() {
            reasons.push(EmptyResult::NoPagesRetained);
        }
        if self.found_identifiers.is_empty() {
            if self.unmatched_identifiers.is_empty() {
                reasons.push(EmptyResult::NoIdentifiers);
            } else {
                reasons.push(EmptyResult::NoMatches);
            }
        }
        reasons
    }

    /// Pages whose text could not be extracted.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.page_outcomes
            .iter()
            .filter(|o| o.extraction_failed)
            .map(|o| o.page_index)
            .collect()
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

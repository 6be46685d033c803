//! Run-wide state, built up one page at a time.
//!
//! Page analysis never touches shared state. It returns a [`PageAnalysis`]
//! that the run merges into its [`RunAccumulator`].

use super::result::{PageOutcome, RunResult};
use crate::annotations::HighlightAnnotation;
use crate::search::MatchKind;
use indexmap::IndexSet;

/// Everything one page contributes to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnalysis {
    /// Page index (0-based)
    pub page_index: usize,
    /// Resolved highlights, identifiers first, then fixed phrases
    pub annotations: Vec<HighlightAnnotation>,
    /// True when the page could not be read
    pub extraction_failed: bool,
}

impl PageAnalysis {
    /// Analysis of a page that yielded the given annotations.
    pub fn new(page_index: usize, annotations: Vec<HighlightAnnotation>) -> Self {
        Self {
            page_index,
            annotations,
            extraction_failed: false,
        }
    }

    /// A page that could not be read counts as having no matches.
    pub fn failed(page_index: usize) -> Self {
        Self {
            page_index,
            annotations: Vec::new(),
            extraction_failed: true,
        }
    }

    /// True when the page has something to highlight.
    pub fn has_highlights(&self) -> bool {
        !self.annotations.is_empty()
    }

    /// Identifiers matched on the page, in match order.
    pub fn found_identifiers(&self) -> impl Iterator<Item = &str> {
        self.annotations
            .iter()
            .filter(|a| a.kind == MatchKind::Identifier)
            .map(|a| a.label.as_str())
    }
}

/// Found-set and page bookkeeping for one run.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    found: IndexSet<String>,
    outcomes: Vec<PageOutcome>,
    total_highlights: usize,
}

impl RunAccumulator {
    /// Start an empty run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a page into the run. `applied` is the number of highlights that
    /// were actually written to the document.
    pub fn merge(&mut self, analysis: &PageAnalysis, applied: usize) {
        for id in analysis.found_identifiers() {
            if !self.found.contains(id) {
                self.found.insert(id.to_string());
            }
        }
        self.total_highlights += applied;
        self.outcomes.push(PageOutcome {
            page_index: analysis.page_index,
            had_any_highlight: analysis.has_highlights(),
            highlight_count: applied,
            extraction_failed: analysis.extraction_failed,
        });
    }

    /// Close the run against the full identifier list.
    pub fn finish(mut self, identifiers: &[String]) -> RunResult {
        self.outcomes.sort_by_key(|o| o.page_index);
        let output_pages = self
            .outcomes
            .iter()
            .filter(|o| o.had_any_highlight)
            .map(|o| o.page_index)
            .collect();
        let unmatched_identifiers = unmatched_identifiers(identifiers, &self.found);
        RunResult {
            output_pages,
            found_identifiers: self.found,
            unmatched_identifiers,
            total_highlights: self.total_highlights,
            page_outcomes: self.outcomes,
        }
    }
}

/// Identifiers in load order that were never found. Duplicates stay as loaded.
pub fn unmatched_identifiers(identifiers: &[String], found: &IndexSet<String>) -> Vec<String> {
    identifiers
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && !found.contains(*id))
        .map(str::to_string)
        .collect()
}

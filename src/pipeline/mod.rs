//! Page-by-page matching pipeline.
//!
//! [`Engine`] drives a run: it analyzes each page into a [`PageAnalysis`],
//! applies the highlights, and folds the page into a [`RunAccumulator`]. The
//! accumulator produces the final [`RunResult`], including the identifiers
//! that were never found.

pub mod accumulator;
pub mod engine;
pub mod result;

pub use accumulator::{unmatched_identifiers, PageAnalysis, RunAccumulator};
pub use engine::Engine;
pub use result::{EmptyResult, PageOutcome, RunResult};

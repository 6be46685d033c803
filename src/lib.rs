// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Idmark
//!
//! Find identifiers from a spreadsheet inside a PDF, highlight every
//! occurrence, keep only the pages that matched and report what was never
//! found.
//!
//! ## Core Features
//!
//! - **Identifier Sources**: first column of XLSX/XLS/XLSB/ODS workbooks or
//!   delimited text, with `nan` and blank cells skipped
//! - **Text Location**: word tokens with page-space boxes, read straight from
//!   page content streams (text and graphics state, Form XObjects, simple and
//!   CID font widths)
//! - **Highlight Policies**: mark the matched token only, or its whole text row
//! - **Fixed Phrases**: structural phrases that always keep their page
//! - **Page Assembly**: output keeps matching pages in source order, with real
//!   `/Highlight` annotations baked in
//! - **Unmatched Report**: CSV of every identifier that never matched
//!
//! ## Architecture
//!
//! ```text
//! identifier bytes ──► identifiers::load_identifiers ──► Vec<String>
//!                                                            │
//! Document (PdfDocument | MemoryDocument)                    ▼
//!     │ page_tokens / search_phrase              pipeline::Engine::run
//!     └──────────────────────────────────────────►   │
//!                                                     ├─ search::OccurrenceMatcher
//!                                                     ├─ highlight::RegionResolver ─ layout::RowGrouper
//!                                                     └─ pipeline::RunAccumulator ─► RunResult
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_idmark::{load_identifiers, Engine, EngineConfig, HighlightPolicy, LoaderOptions, PdfDocument};
//!
//! # fn main() -> pdf_idmark::Result<()> {
//! let ids = load_identifiers(&std::fs::read("ids.xlsx")?, &LoaderOptions::default())?;
//! let mut doc = PdfDocument::open("statement.pdf")?;
//!
//! let engine = Engine::new(EngineConfig::new().with_policy(HighlightPolicy::RowBound))?;
//! let mut out = std::fs::File::create("highlighted_statement.pdf")?;
//! let result = engine.run_to_writer(&mut doc, &ids, &mut out)?;
//!
//! println!("kept pages {:?}, missing {:?}", result.output_pages, result.unmatched_identifiers);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry and layout
pub mod geometry;
pub mod layout;

// Content stream interpretation
pub mod content;
pub mod extractors;

// Documents and annotations
pub mod annotations;
pub mod document;

// Matching
pub mod highlight;
pub mod search;

// Inputs and outputs
pub mod identifiers;
pub mod report;

// Run orchestration
pub mod pipeline;

pub use annotations::HighlightAnnotation;
pub use config::{EngineConfig, HighlightStyle, IdmarkConfig, RowOptions, RowSpan};
pub use document::{Document, MemoryDocument, PdfDocument, Token};
pub use error::{Error, Result};
pub use geometry::Rect;
pub use highlight::{HighlightPolicy, RegionResolver};
pub use identifiers::{load_identifiers, LoaderOptions, SourceFormat};
pub use pipeline::{EmptyResult, Engine, PageOutcome, RunResult};
pub use report::{unmatched_report, DEFAULT_REPORT_COLUMN};
pub use search::{MatchKind, MatchRecord, OccurrenceMatcher};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

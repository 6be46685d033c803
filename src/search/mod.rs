//! Finding identifiers and structural phrases on a page.
//!
//! - [`OccurrenceMatcher`] compares whole tokens with the loaded identifiers.
//! - [`PhraseSearcher`] finds literal phrases that may span several tokens of
//!   one row.

mod matcher;
mod phrase;

pub use matcher::{MatchKind, MatchRecord, OccurrenceMatcher};
pub use phrase::PhraseSearcher;

//! The matching engine.
//!
//! ```text
//! identifiers ──► OccurrenceMatcher
//!                       │
//! page i ──► tokens ──► MatchRecords ──► RegionResolver ──► PageAnalysis
//!                                                               │
//!                       add_highlight ◄── merge in page order ◄─┘
//!                                                               │
//!                       write_pages(output_pages) ◄── RunResult ┘
//! ```

use super::accumulator::{PageAnalysis, RunAccumulator};
use super::result::RunResult;
use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::Result;
use crate::highlight::RegionResolver;
use crate::search::{MatchRecord, OccurrenceMatcher, PhraseSearcher};
use std::io::Write;

/// Runs identifier matching and annotation over documents.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    phrases: Vec<PhraseSearcher>,
}

impl Engine {
    /// Create an engine. The configuration is validated and the fixed
    /// phrases compiled up front.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let phrases = config
            .fixed_phrases
            .iter()
            .map(|phrase| PhraseSearcher::new(phrase, config.phrase_case_insensitive))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, phrases })
    }

    /// Current configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one page without modifying the document.
    ///
    /// A page that cannot be read is logged and reported as a failed page with
    /// no matches; it never aborts the run.
    pub fn analyze_page<D>(&self, doc: &D, matcher: &OccurrenceMatcher, page_index: usize) -> PageAnalysis
    where
        D: Document + ?Sized,
    {
        match self.try_analyze_page(doc, matcher, page_index) {
            Ok(analysis) => analysis,
            Err(e) => {
                log::warn!("Page {}: skipped, {}", page_index, e);
                PageAnalysis::failed(page_index)
            },
        }
    }

    fn try_analyze_page<D>(&self, doc: &D, matcher: &OccurrenceMatcher, page_index: usize) -> Result<PageAnalysis>
    where
        D: Document + ?Sized,
    {
        let bounds = doc.page_bounds(page_index)?;
        let tokens = doc.page_tokens(page_index)?;
        let mut records = matcher.match_tokens(&tokens);

        for searcher in &self.phrases {
            for rect in doc.search_phrase(page_index, &tokens, searcher, self.config.rows.tolerance)? {
                records.push(MatchRecord::phrase(searcher.phrase(), page_index, rect));
            }
        }

        let resolver = RegionResolver::new(self.config.policy, &tokens, bounds, self.config.rows);
        let annotations: Vec<_> = records.iter().map(|r| resolver.resolve(r)).collect();
        log::debug!(
            "Page {}: {} tokens, {} matches",
            page_index,
            tokens.len(),
            annotations.len()
        );
        Ok(PageAnalysis::new(page_index, annotations))
    }

    /// Apply a page's highlights and return how many were written.
    fn apply<D>(&self, doc: &mut D, analysis: &PageAnalysis) -> usize
    where
        D: Document + ?Sized,
    {
        let mut applied = 0;
        for annot in &analysis.annotations {
            match doc.add_highlight(annot.page_index, annot.rect, &self.config.style, &annot.label) {
                Ok(()) => applied += 1,
                Err(e) => log::warn!("Page {}: cannot add highlight for '{}': {}", annot.page_index, annot.label, e),
            }
        }
        applied
    }

    /// Match `identifiers` in `doc` and annotate every occurrence in place.
    ///
    /// Pages are processed in order. Running twice on fresh copies of the same
    /// document gives identical results.
    pub fn run<D>(&self, doc: &mut D, identifiers: &[String]) -> RunResult
    where
        D: Document + ?Sized,
    {
        let matcher = OccurrenceMatcher::new(identifiers);
        let mut accumulator = RunAccumulator::new();

        for page_index in 0..doc.page_count() {
            let analysis = self.analyze_page(&*doc, &matcher, page_index);
            let applied = self.apply(doc, &analysis);
            accumulator.merge(&analysis, applied);
        }

        self.finish(accumulator, identifiers)
    }

    /// Like [`Engine::run`], with page analysis spread over the rayon pool.
    ///
    /// Highlights are still applied one page at a time in page order, so the
    /// result is identical to a sequential run.
    #[cfg(feature = "parallel")]
    pub fn run_parallel<D>(&self, doc: &mut D, identifiers: &[String]) -> RunResult
    where
        D: Document + Sync + ?Sized,
    {
        use rayon::prelude::*;

        let matcher = OccurrenceMatcher::new(identifiers);
        let analyses: Vec<PageAnalysis> = {
            let shared: &D = doc;
            (0..shared.page_count())
                .into_par_iter()
                .map(|page_index| self.analyze_page(shared, &matcher, page_index))
                .collect()
        };

        let mut accumulator = RunAccumulator::new();
        for analysis in &analyses {
            let applied = self.apply(doc, analysis);
            accumulator.merge(analysis, applied);
        }
        self.finish(accumulator, identifiers)
    }

    /// Run and write the retained pages to `out`.
    pub fn run_to_writer<D>(&self, doc: &mut D, identifiers: &[String], out: &mut dyn Write) -> Result<RunResult>
    where
        D: Document + ?Sized,
    {
        let result = self.run(doc, identifiers);
        doc.write_pages(&result.output_pages, out)?;
        Ok(result)
    }

    fn finish(&self, accumulator: RunAccumulator, identifiers: &[String]) -> RunResult {
        let result = accumulator.finish(identifiers);
        for reason in result.empty_reasons() {
            log::warn!("Empty result: {}", reason);
        }
        log::info!(
            "Matched {} of {} identifiers, {} highlights on {} pages",
            result.found_identifiers.len(),
            identifiers.len(),
            result.total_highlights,
            result.output_pages.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowSpan;
    use crate::document::{MemoryDocument, LETTER};
    use crate::geometry::Rect;
    use crate::highlight::HighlightPolicy;
    use crate::pipeline::EmptyResult;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![("Header", Rect::new(20.0, 750.0, 80.0, 762.0))]);
        doc.push_page(
            LETTER,
            vec![
                ("Name", Rect::new(20.0, 700.0, 60.0, 712.0)),
                ("B200", Rect::new(100.0, 700.0, 140.0, 712.0)),
            ],
        );
        doc.push_unreadable_page(LETTER);
        doc
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Engine::new(EngineConfig::new().with_row_tolerance(f32::NAN)).is_err());
    }

    #[test]
    fn test_run_marks_and_isolates_failures() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let mut doc = doc();
        let result = engine.run(&mut doc, &ids(&["B200", "Z9"]));

        assert_eq!(result.output_pages, vec![1]);
        assert_eq!(result.unmatched_identifiers, ids(&["Z9"]));
        assert_eq!(result.total_highlights, 1);
        assert_eq!(result.failed_pages(), vec![2]);
        assert_eq!(doc.marks(1)[0].rect, Rect::new(100.0, 700.0, 140.0, 712.0));
        assert_eq!(doc.marks(1)[0].label, "B200");
    }

    #[test]
    fn test_row_bound_full_width() {
        let config = EngineConfig::new()
            .with_policy(HighlightPolicy::RowBound)
            .with_row_span(RowSpan::FullWidth { margin: 10.0 });
        let engine = Engine::new(config).unwrap();
        let mut doc = doc();
        engine.run(&mut doc, &ids(&["B200"]));
        assert_eq!(doc.marks(1)[0].rect, Rect::new(10.0, 700.0, 602.0, 712.0));
    }

    #[test]
    fn test_fixed_phrase_keeps_page() {
        let config = EngineConfig::new()
            .with_fixed_phrase("header")
            .with_phrase_case_insensitive(true);
        let engine = Engine::new(config).unwrap();
        let mut doc = doc();
        let result = engine.run(&mut doc, &[]);
        assert_eq!(result.output_pages, vec![0]);
        assert!(result.found_identifiers.is_empty());
        assert_eq!(result.empty_reasons(), vec![EmptyResult::NoIdentifiers]);
        assert_eq!(doc.marks(0)[0].label, "header");
    }

    #[test]
    fn test_fixed_phrase_follows_row_tolerance() {
        let mut page = MemoryDocument::new();
        page.push_page(
            LETTER,
            vec![
                ("ACME", Rect::new(10.0, 700.0, 40.0, 712.0)),
                ("HOLDINGS", Rect::new(45.0, 714.0, 90.0, 726.0)),
            ],
        );

        let tight = Engine::new(EngineConfig::new().with_fixed_phrase("ACME HOLDINGS")).unwrap();
        let result = tight.run(&mut page.clone(), &[]);
        assert!(result.output_pages.is_empty());

        let loose = Engine::new(
            EngineConfig::new()
                .with_fixed_phrase("ACME HOLDINGS")
                .with_row_tolerance(8.0),
        )
        .unwrap();
        let result = loose.run(&mut page, &[]);
        assert_eq!(result.output_pages, vec![0]);
        assert_eq!(page.marks(0)[0].rect, Rect::new(10.0, 700.0, 90.0, 726.0));
        assert_eq!(page.marks(0)[0].label, "ACME HOLDINGS");
    }

    #[test]
    fn test_unmatched_run_reports_no_matches() {
        let engine = Engine::new(EngineConfig::new().with_fixed_phrase("Header")).unwrap();
        let mut doc = doc();
        let result = engine.run(&mut doc, &ids(&["Z9"]));
        assert_eq!(result.output_pages, vec![0]);
        assert_eq!(result.empty_reasons(), vec![EmptyResult::NoMatches]);
    }

    #[test]
    fn test_run_to_writer_placeholder() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let mut doc = doc();
        let mut out = Vec::new();
        let result = engine.run_to_writer(&mut doc, &ids(&["nothing"]), &mut out).unwrap();
        assert!(result.is_empty());
        let pages: Vec<crate::document::memory::AssembledPage> = serde_json::from_slice(&out).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source_index, None);
    }
}

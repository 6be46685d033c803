//! End-to-end engine behavior on in-memory documents.

use pdf_idmark::config::RowSpan;
use pdf_idmark::document::memory::AssembledPage;
use pdf_idmark::document::LETTER;
use pdf_idmark::{Engine, EngineConfig, HighlightPolicy, MemoryDocument, Rect};

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn word(text: &str, x0: f32, y0: f32) -> (&str, Rect) {
    (text, Rect::new(x0, y0, x0 + 40.0, y0 + 12.0))
}

fn engine(policy: HighlightPolicy) -> Engine {
    Engine::new(EngineConfig::new().with_policy(policy)).unwrap()
}

mod scenarios {
    use super::*;

    #[test]
    fn test_single_match_on_second_page() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("Intro", 20.0, 700.0)]);
        doc.push_page(LETTER, vec![word("B200", 20.0, 700.0)]);
        doc.push_page(LETTER, vec![word("Appendix", 20.0, 700.0)]);

        let result = engine(HighlightPolicy::TokenBound).run(&mut doc, &ids(&["A100", "B200", "C300"]));

        assert_eq!(result.output_pages, vec![1]);
        assert_eq!(result.found_identifiers.iter().collect::<Vec<_>>(), vec!["B200"]);
        assert_eq!(result.unmatched_identifiers, ids(&["A100", "C300"]));
        assert_eq!(result.total_highlights, 1);
    }

    #[test]
    fn test_empty_identifier_list() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("A100", 20.0, 700.0)]);

        let result = engine(HighlightPolicy::TokenBound).run(&mut doc, &[]);

        assert!(result.output_pages.is_empty());
        assert!(result.found_identifiers.is_empty());
        assert!(result.unmatched_identifiers.is_empty());
        assert_eq!(result.page_outcomes.len(), 1);
        assert!(!result.page_outcomes[0].had_any_highlight);
    }

    #[test]
    fn test_empty_identifier_list_with_fixed_phrase() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("Intro", 20.0, 700.0)]);
        doc.push_page(
            LETTER,
            vec![word("PROVIDENT", 20.0, 700.0), word("FUND", 70.0, 700.0)],
        );

        let engine = Engine::new(EngineConfig::new().with_fixed_phrase("PROVIDENT FUND")).unwrap();
        let result = engine.run(&mut doc, &[]);

        assert_eq!(result.output_pages, vec![1]);
        assert!(result.found_identifiers.is_empty());
        assert_eq!(doc.marks(1)[0].rect, Rect::new(20.0, 700.0, 110.0, 712.0));
    }

    #[test]
    fn test_row_bound_spans_repeated_identifier() {
        let mut doc = MemoryDocument::new();
        doc.push_page(
            LETTER,
            vec![
                ("Label", Rect::new(20.0, 700.0, 60.0, 712.0)),
                ("X1", Rect::new(100.0, 700.5, 115.0, 711.5)),
                ("X1", Rect::new(300.0, 700.5, 315.0, 711.5)),
                ("Other", Rect::new(20.0, 650.0, 60.0, 662.0)),
            ],
        );

        let result = engine(HighlightPolicy::RowBound).run(&mut doc, &ids(&["X1"]));

        assert_eq!(result.total_highlights, 2);
        let marks = doc.marks(0);
        assert_eq!(marks.len(), 2);
        for mark in marks {
            assert_eq!(mark.rect, Rect::new(20.0, 700.0, 315.0, 712.0));
            assert!(mark.rect.contains(&Rect::new(100.0, 700.5, 115.0, 711.5)));
            assert!(mark.rect.contains(&Rect::new(300.0, 700.5, 315.0, 711.5)));
        }
    }

    #[test]
    fn test_matches_on_two_of_five_pages() {
        let mut doc = MemoryDocument::new();
        for page in 0..5 {
            let text = if page == 1 || page == 3 { "EMP042" } else { "filler" };
            doc.push_page(LETTER, vec![word(text, 20.0, 700.0), word("x", 80.0, 700.0)]);
        }

        let result = engine(HighlightPolicy::TokenBound).run(&mut doc, &ids(&["EMP042"]));

        assert_eq!(result.output_pages, vec![1, 3]);
        assert!(result.unmatched_identifiers.is_empty());
    }
}

mod assembly {
    use super::*;

    #[test]
    fn test_written_pages_follow_source_order() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("C300", 20.0, 700.0)]);
        doc.push_page(LETTER, vec![word("none", 20.0, 700.0)]);
        doc.push_page(LETTER, vec![word("A100", 20.0, 700.0)]);

        let mut out = Vec::new();
        let result = engine(HighlightPolicy::TokenBound)
            .run_to_writer(&mut doc, &ids(&["A100", "C300"]), &mut out)
            .unwrap();

        assert_eq!(result.output_pages, vec![0, 2]);
        let pages: Vec<AssembledPage> = serde_json::from_slice(&out).unwrap();
        let sources: Vec<Option<usize>> = pages.iter().map(|p| p.source_index).collect();
        assert_eq!(sources, vec![Some(0), Some(2)]);
        assert_eq!(pages[1].marks[0].label, "A100");
    }

    #[test]
    fn test_no_matches_gives_placeholder_page() {
        let mut doc = MemoryDocument::new();
        doc.push_page(Rect::new(0.0, 0.0, 595.0, 842.0), vec![word("none", 20.0, 700.0)]);

        let mut out = Vec::new();
        let result = engine(HighlightPolicy::TokenBound)
            .run_to_writer(&mut doc, &ids(&["A100"]), &mut out)
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.unmatched_identifiers, ids(&["A100"]));
        let pages: Vec<AssembledPage> = serde_json::from_slice(&out).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source_index, None);
        assert_eq!(pages[0].bounds, Rect::new(0.0, 0.0, 595.0, 842.0));
    }

    #[test]
    fn test_full_width_row_highlight() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("A100", 200.0, 700.0)]);
        let config = EngineConfig::new()
            .with_policy(HighlightPolicy::RowBound)
            .with_row_span(RowSpan::FullWidth { margin: 10.0 });
        Engine::new(config).unwrap().run(&mut doc, &ids(&["A100"]));

        // Alone on its row: padded by the default row padding
        assert_eq!(doc.marks(0)[0].rect, Rect::new(10.0, 699.0, 602.0, 713.0));
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_unreadable_page_does_not_abort_run() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("A100", 20.0, 700.0)]);
        doc.push_unreadable_page(LETTER);
        doc.push_page(LETTER, vec![word("B200", 20.0, 700.0)]);

        let result = engine(HighlightPolicy::RowBound).run(&mut doc, &ids(&["A100", "B200"]));

        assert_eq!(result.output_pages, vec![0, 2]);
        assert_eq!(result.failed_pages(), vec![1]);
        assert!(result.unmatched_identifiers.is_empty());
        assert!(!result.page_outcomes[1].had_any_highlight);
    }

    #[test]
    fn test_unmatched_duplicates_kept_in_load_order() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("B", 20.0, 700.0)]);

        let result = engine(HighlightPolicy::TokenBound).run(&mut doc, &ids(&["C", "B", "A", "C", "B"]));

        assert_eq!(result.unmatched_identifiers, ids(&["C", "A", "C"]));
        assert_eq!(result.found_identifiers.len(), 1);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let mut doc = MemoryDocument::new();
        doc.push_page(LETTER, vec![word("A100", 20.0, 700.0)]);
        let result = engine(HighlightPolicy::TokenBound).run(&mut doc, &ids(&["A100", "Z"]));

        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["output_pages"], serde_json::json!([0]));
        assert_eq!(json["found_identifiers"], serde_json::json!(["A100"]));
        assert_eq!(json["unmatched_identifiers"], serde_json::json!(["Z"]));
        assert_eq!(json["page_outcomes"][0]["highlight_count"], 1);
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::*;
    use pdf_idmark::Document;

    #[test]
    fn test_parallel_run_matches_sequential() {
        let mut doc = MemoryDocument::new();
        for page in 0..12 {
            let text = if page % 3 == 0 { "HIT" } else { "miss" };
            doc.push_page(LETTER, vec![word(text, 20.0, 700.0), word("HIT2", 120.0, 700.5)]);
        }
        doc.push_unreadable_page(LETTER);

        let engine = engine(HighlightPolicy::RowBound);
        let identifiers = ids(&["HIT", "NOPE"]);
        let mut sequential_doc = doc.clone();
        let mut parallel_doc = doc.clone();
        let sequential = engine.run(&mut sequential_doc, &identifiers);
        let parallel = engine.run_parallel(&mut parallel_doc, &identifiers);

        assert_eq!(sequential, parallel);
        assert_eq!(sequential_doc, parallel_doc);
        assert_eq!(parallel.output_pages, vec![0, 3, 6, 9]);
        assert_eq!(parallel_doc.page_count(), 13);
    }
}

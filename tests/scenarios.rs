//! End-to-end pagination and export scenarios

use std::time::Duration;

use chrono::DateTime;
use legalpad::document::{Block, Document};
use legalpad::export::{self, ExportFormat, ExportJob};
use legalpad::layout::{
    paginate, FixedMeasurer, MetricsMeasurer, PageGeometry, PageGeometryConfig,
};
use legalpad::render::build_fragments;
use legalpad::{
    CommentStore, DraftRasterizer, EditorCommands, EditorSettings, Mark, MarkLedger, Session,
    TextRange,
};

const BREAK: &str = r#"<div data-type="page-break" class="page-break"></div>"#;

fn geometry() -> PageGeometry {
    PageGeometry::new(&PageGeometryConfig::default()).unwrap()
}

fn page_texts(doc: &Document, measurer: &FixedMeasurer) -> Vec<Vec<String>> {
    paginate(doc.blocks(), &geometry(), measurer)
        .iter()
        .map(|page| page.blocks.iter().map(Block::text).collect())
        .collect()
}

#[test]
fn scenario_a_short_paragraphs_share_a_page() {
    let third = geometry().layout_height() / 3.0;
    let doc = Document::from_html("<p>one</p><p>two</p><p>three</p>");
    let measurer = FixedMeasurer::new(third - 1.0);

    let pages = paginate(doc.blocks(), &geometry(), &measurer);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].blocks.len(), 3);
}

#[test]
fn scenario_b_tall_second_paragraph_moves_to_next_page() {
    let usable = geometry().layout_height();
    let doc = Document::from_html("<p>first</p><p>second</p>");
    let measurer = FixedMeasurer::new(0.0)
        .with_height("first", usable * 0.6)
        .with_height("second", usable * 0.5);

    assert_eq!(
        page_texts(&doc, &measurer),
        vec![vec!["first".to_string()], vec!["second".to_string()]]
    );
}

#[test]
fn scenario_c_explicit_break_ignores_heights() {
    let doc = Document::from_html(&format!("<p>para1</p>{BREAK}<p>para2</p>"));
    for height in [1.0, 100.0, 10_000.0] {
        assert_eq!(
            page_texts(&doc, &FixedMeasurer::new(height)),
            vec![vec!["para1".to_string()], vec!["para2".to_string()]]
        );
    }
}

#[test]
fn scenario_d_watermarked_pdf_has_one_page_per_layout_page() {
    let mut html = String::new();
    for i in 0..40 {
        html.push_str(&format!(
            "<p>Clause {i}: the parties agree to the terms set out in the schedule, \
             including every obligation that survives termination.</p>"
        ));
    }
    html.push_str(BREAK);
    html.push_str("<h2>Signatures</h2>");
    let doc = Document::from_html(&html);
    let measurer = MetricsMeasurer::new();

    let config = PageGeometryConfig::default();
    let expected = paginate(doc.blocks(), &PageGeometry::for_export(&config).unwrap(), &measurer).len();
    assert!(expected >= 2);

    let job = ExportJob::new(ExportFormat::Pdf, config).with_watermark("DRAFT");
    let artifact = export::export(&doc, job, &measurer, &mut DraftRasterizer::new()).unwrap();

    assert!(!artifact.is_partial());
    assert_eq!(artifact.page_count, expected);
    let pdf = lopdf::Document::load_mem(&artifact.bytes).unwrap();
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), expected);

    // Each page carries its own text, not placeholder shapes
    let text_of = |number: u32| {
        String::from_utf8_lossy(&pdf.get_page_content(pages[&number]).unwrap()).into_owned()
    };
    assert!(text_of(1).contains("(Clause 0:"));
    assert!(text_of(expected as u32).contains("(Signatures)"));
    assert!(text_of(1).contains("(DRAFT)"));
}

#[test]
fn scenario_e_comment_round_trip_restores_marks() {
    let mut engine = MarkLedger::new(100);
    engine
        .apply_mark(&Mark::Bold, TextRange::new(0, 10))
        .unwrap();
    let before = engine.marks().to_vec();

    let mut store = CommentStore::new();
    let now = DateTime::from_timestamp_millis(1_717_171_717_000).unwrap();
    let id = store
        .add(&mut engine, TextRange::new(4, 20), "Define this term", "Reviewer", now)
        .unwrap()
        .id
        .clone();
    assert_eq!(engine.marks().len(), before.len() + 1);
    assert_eq!(store.len(), 1);

    store.remove(&mut engine, &id).unwrap();
    assert_eq!(engine.marks(), before.as_slice());
    assert!(store.get(&id).is_none());
    assert!(store.is_empty());
}

#[test]
fn pages_concatenate_to_the_document() {
    let mut html = String::new();
    for i in 0..30 {
        html.push_str(&format!("<p>block {i}</p>"));
        if i % 7 == 0 {
            html.push_str(BREAK);
        }
    }
    let doc = Document::from_html(&html);
    let measurer = FixedMeasurer::new(150.0).with_height("block 12", 5000.0);

    let pages = paginate(doc.blocks(), &geometry(), &measurer);
    let flattened: Vec<&Block> = pages.iter().flat_map(|p| p.blocks.iter()).collect();
    let content: Vec<&Block> = doc.blocks().iter().filter(|b| !b.is_page_break()).collect();
    assert_eq!(flattened, content);

    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.index, i);
    }
}

#[test]
fn pagination_is_idempotent() {
    let doc = Document::from_html(&"<p>some clause text</p>".repeat(60));
    let measurer = MetricsMeasurer::new();
    assert_eq!(
        paginate(doc.blocks(), &geometry(), &measurer),
        paginate(doc.blocks(), &geometry(), &measurer)
    );
}

#[test]
fn empty_document_has_one_empty_page() {
    let pages = paginate(Document::new().blocks(), &geometry(), &MetricsMeasurer::new());
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
}

#[test]
fn only_breaks_give_empty_pages() {
    for n in 1..5 {
        let doc = Document::from_html(&BREAK.repeat(n));
        let pages = paginate(doc.blocks(), &geometry(), &MetricsMeasurer::new());
        assert_eq!(pages.len(), n + 1);
        assert!(pages.iter().all(|p| p.is_empty()));
    }
}

#[test]
fn oversized_block_sits_alone() {
    let usable = geometry().layout_height();
    let doc = Document::from_html("<p>a</p><p>huge</p><p>b</p>");
    let measurer = FixedMeasurer::new(10.0).with_height("huge", usable * 3.0);

    assert_eq!(
        page_texts(&doc, &measurer),
        vec![
            vec!["a".to_string()],
            vec!["huge".to_string()],
            vec!["b".to_string()]
        ]
    );
}

#[test]
fn watermark_does_not_move_breaks() {
    let mut session =
        Session::new(EditorSettings::default(), Box::new(MetricsMeasurer::new())).unwrap();
    session.apply_snapshot(&"<p>a reasonably long clause of the agreement</p>".repeat(80), Duration::ZERO);
    let before = session.pages().to_vec();

    session.set_watermark("CONFIDENTIAL");
    assert_eq!(session.pages(), before.as_slice());

    let fragments = build_fragments(&before, session.geometry(), None, "CONFIDENTIAL");
    let plain = build_fragments(&before, session.geometry(), None, "");
    assert_eq!(fragments.len(), plain.len());
    for (marked, unmarked) in fragments.iter().zip(&plain) {
        assert_eq!(marked.blocks, unmarked.blocks);
        assert!(marked.watermark.is_some());
    }
}

#[test]
fn docx_and_html_exports_from_session() {
    let mut session =
        Session::new(EditorSettings::default(), Box::new(MetricsMeasurer::new())).unwrap();
    session.load_template("notice", Duration::ZERO).unwrap();

    let html = session
        .export(
            session.export_job(ExportFormat::Html).with_filename("notice"),
            &mut DraftRasterizer::new(),
        )
        .unwrap();
    assert_eq!(html.filename, "notice.html");
    let text = String::from_utf8(html.bytes).unwrap();
    assert!(text.contains(session.document().html()));

    let docx = session
        .export(
            session.export_job(ExportFormat::Docx).with_filename("notice"),
            &mut DraftRasterizer::new(),
        )
        .unwrap();
    assert_eq!(docx.filename, "notice.docx");
    assert!(docx.bytes.starts_with(b"PK"));
}

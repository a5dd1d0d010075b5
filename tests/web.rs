//! Browser tests of the WASM bindings.
//!
//! Run with: wasm-pack test --headless --chrome

#![cfg(target_arch = "wasm32")]

use std::io::Cursor;

use js_sys::{Function, Reflect};
use legalpad::{WasmPdfExport, WasmSession};
use wasm_bindgen::{JsError, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn ok<T>(result: Result<T, JsError>) -> T {
    result.unwrap_or_else(|_| panic!("binding call failed"))
}

/// Session whose host measures every block at `height` pixels
fn session(height: f64) -> WasmSession {
    let measure = Function::new_with_args("html, width", &format!("return {height};"));
    ok(WasmSession::new(None, Some(measure)))
}

/// Editor stand-in accepting every command and counting cleared marks
fn editor() -> JsValue {
    Function::new_no_args(
        "return {
            cleared: 0,
            applyMark() { return true; },
            removeMark() { return true; },
            clearMark() { this.cleared += 1; return true; },
            toggleBlock() { return true; },
            insertPageBreak() { return true; },
        };",
    )
    .call0(&JsValue::NULL)
    .unwrap()
}

/// `localStorage` stand-in holding one saved snapshot
fn storage_with(html: &str) -> JsValue {
    let store = Function::new_with_args(
        "saved",
        "const slots = { 'legalpad-document': saved };
         return {
            getItem(key) { return key in slots ? slots[key] : null; },
            setItem(key, value) { slots[key] = value; },
         };",
    );
    store.call1(&JsValue::NULL, &JsValue::from_str(html)).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[wasm_bindgen_test]
fn test_snapshot_uses_host_measurement() {
    let mut session = session(600.0);
    session.apply_snapshot("<p>a</p><p>b</p><p>c</p>", 0.0);
    assert_eq!(session.get_page_count(), 3);
    assert_eq!(session.get_char_count(), 3);
}

#[wasm_bindgen_test]
fn test_invalid_settings_rejected() {
    assert!(WasmSession::new(Some("{not json".into()), None).is_err());
    let mut session = session(10.0);
    assert!(session.set_margins(200.0, 200.0, 20.0, 20.0).is_err());
}

#[wasm_bindgen_test]
fn test_restore_clears_orphaned_marks() {
    let mut session = session(10.0);
    let restored = ok(session.attach_storage(storage_with(
        r#"<p>See <span data-comment-id="comment-1" class="comment-highlight">this</span></p>"#,
    )));
    assert!(restored.unwrap().contains("comment-1"));
    assert_eq!(session.get_orphan_marks(), vec!["comment-1".to_string()]);

    let editor = editor();
    session.attach_editor(editor.clone());
    assert_eq!(ok(session.clear_orphan_marks()), 1);
    assert!(session.get_orphan_marks().is_empty());
    assert_eq!(
        Reflect::get(&editor, &JsValue::from_str("cleared")).unwrap(),
        JsValue::from_f64(1.0)
    );
}

#[wasm_bindgen_test]
fn test_comments_need_an_editor() {
    let mut session = session(10.0);
    assert!(session.add_comment(0, 4, "note", "Ann").is_err());
    session.attach_editor(editor());
    ok(session.add_comment(0, 4, "note", "Ann"));
}

#[wasm_bindgen_test]
fn test_pdf_export_pulls_pages() {
    let mut session = session(10.0);
    session.apply_snapshot(
        r#"<p>one</p><div class="page-break"></div><p>two</p>"#,
        0.0,
    );
    let mut export: WasmPdfExport = ok(session.begin_pdf_export(Some("brief".into()), false));
    assert_eq!(export.page_count(), 2);
    assert!(export.next_page_html().unwrap().contains("one"));

    ok(export.submit_png(&png(8, 10)));
    ok(export.fail_page("canvas tainted"));
    let artifact = ok(export.finish());
    assert_eq!(artifact.filename(), "brief.pdf");
    assert!(artifact.is_partial());
    assert!(artifact.bytes().starts_with(b"%PDF"));
}

#[wasm_bindgen_test]
fn test_docx_export() {
    let mut session = session(10.0);
    ok(session.load_template("letter", 0.0));
    let artifact = ok(session.export_docx(Some("letter".into())));
    assert_eq!(artifact.filename(), "letter.docx");
    assert!(artifact.bytes().starts_with(b"PK"));
}

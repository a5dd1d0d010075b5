//! WASM bindings for the browser host

use std::time::Duration;

use chrono::Utc;
use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::document::{Block, Mark};
use crate::editing::{BlockToggle, CommandError, EditorCommands, TextRange};
use crate::export::{self, ExportArtifact, ExportFormat, FailurePolicy, PdfExport};
use crate::layout::{Margins, MeasureError, Measurer, MetricsMeasurer, PaperSize};
use crate::render::{decode_png, export_stylesheet, RasterError};
use crate::storage::{KeyValueStore, StorageError};
use crate::{templates, EditorSettings, Session};

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn millis(now_ms: f64) -> Duration {
    Duration::from_millis(now_ms.max(0.0) as u64)
}

/// Measures blocks through a host callback `(html, width) => height`
struct JsMeasurer {
    callback: Function,
}

impl Measurer for JsMeasurer {
    fn measure(&self, block: &Block, width: f32) -> Result<f32, MeasureError> {
        let height = self
            .callback
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(&block.html),
                &JsValue::from_f64(width as f64),
            )
            .map_err(|err| MeasureError::Surface(describe(&err)))?;
        height
            .as_f64()
            .map(|h| h as f32)
            .ok_or_else(|| MeasureError::Unmeasurable("measure callback returned no number".into()))
    }
}

/// Forwards editing commands to methods of a host object
struct JsCommands {
    target: JsValue,
}

impl JsCommands {
    fn call(&self, command: &'static str, args: &Array) -> Result<(), CommandError> {
        let rejected = |reason: String| CommandError::Rejected { command, reason };
        let method = Reflect::get(&self.target, &JsValue::from_str(command))
            .map_err(|err| rejected(describe(&err)))?;
        let method: Function = method
            .dyn_into()
            .map_err(|_| rejected("editor has no such command".into()))?;
        let result = method
            .apply(&self.target, args)
            .map_err(|err| rejected(describe(&err)))?;
        if result.as_bool() == Some(false) {
            return Err(rejected("command could not run".into()));
        }
        Ok(())
    }

    fn mark_attrs(mark: &Mark) -> Object {
        let attrs = Object::new();
        for (key, value) in mark.attrs() {
            // Setting a property on a fresh object cannot fail
            let _ = Reflect::set(&attrs, &JsValue::from_str(key), &JsValue::from_str(value));
        }
        attrs
    }

    fn mark_args(mark: &Mark, range: TextRange) -> Array {
        Array::of4(
            &JsValue::from_str(mark.kind().name()),
            &Self::mark_attrs(mark),
            &JsValue::from_f64(range.from as f64),
            &JsValue::from_f64(range.to as f64),
        )
    }
}

impl EditorCommands for JsCommands {
    fn apply_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError> {
        self.call("applyMark", &Self::mark_args(mark, range))
    }

    fn remove_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError> {
        self.call("removeMark", &Self::mark_args(mark, range))
    }

    fn clear_mark(&mut self, mark: &Mark) -> Result<(), CommandError> {
        let args = Array::of2(&JsValue::from_str(mark.kind().name()), &Self::mark_attrs(mark));
        self.call("clearMark", &args)
    }

    fn toggle_block(&mut self, toggle: BlockToggle) -> Result<(), CommandError> {
        let level = match toggle {
            BlockToggle::Heading(level) => JsValue::from_f64(level as f64),
            _ => JsValue::UNDEFINED,
        };
        self.call("toggleBlock", &Array::of2(&JsValue::from_str(toggle.name()), &level))
    }

    fn insert_page_break(&mut self) -> Result<(), CommandError> {
        self.call("insertPageBreak", &Array::new())
    }
}

/// A `Storage`-like host object (`getItem` / `setItem`), e.g. `localStorage`
struct JsStore {
    target: JsValue,
}

impl JsStore {
    fn method(&self, name: &str) -> Result<Function, StorageError> {
        Reflect::get(&self.target, &JsValue::from_str(name))
            .map_err(|err| StorageError::Unavailable(describe(&err)))?
            .dyn_into()
            .map_err(|_| StorageError::Unavailable(format!("storage has no `{name}`")))
    }
}

impl KeyValueStore for JsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .method("getItem")?
            .call1(&self.target, &JsValue::from_str(key))
            .map_err(|err| StorageError::Unavailable(describe(&err)))?;
        Ok(value.as_string())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.method("setItem")?
            .call2(&self.target, &JsValue::from_str(key), &JsValue::from_str(value))
            .map_err(|_| StorageError::QuotaExceeded {
                key: key.to_string(),
                bytes: value.len(),
            })?;
        Ok(())
    }
}

fn toggle_from_name(name: &str, level: Option<u8>) -> Option<BlockToggle> {
    Some(match name {
        "paragraph" => BlockToggle::Paragraph,
        "heading" => BlockToggle::Heading(level.unwrap_or(1)),
        "bulletList" => BlockToggle::BulletList,
        "orderedList" => BlockToggle::OrderedList,
        "blockquote" => BlockToggle::Blockquote,
        "codeBlock" => BlockToggle::CodeBlock,
        _ => return None,
    })
}

/// WASM-exposed session wrapper
#[wasm_bindgen]
pub struct WasmSession {
    session: Session,
    engine: Option<JsCommands>,
    store: Option<JsStore>,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session from JSON settings and an optional measure callback.
    /// Without a callback the built-in font metrics are used.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>, measure: Option<Function>) -> Result<WasmSession, JsError> {
        let settings = match settings_json.as_deref() {
            Some(json) if !json.trim().is_empty() => EditorSettings::from_json(json)?,
            _ => EditorSettings::default(),
        };
        let measurer: Box<dyn Measurer> = match measure {
            Some(callback) => Box::new(JsMeasurer { callback }),
            None => Box::new(MetricsMeasurer::new()),
        };
        Ok(Self {
            session: Session::new(settings, measurer)?,
            engine: None,
            store: None,
        })
    }

    /// Attach the editing engine's command object
    #[wasm_bindgen(js_name = attachEditor)]
    pub fn attach_editor(&mut self, commands: JsValue) {
        self.engine = Some(JsCommands { target: commands });
    }

    /// Attach a storage object and restore the saved snapshot.
    /// Returns the restored HTML so the host can load it into the editor.
    #[wasm_bindgen(js_name = attachStorage)]
    pub fn attach_storage(&mut self, storage: JsValue) -> Result<Option<String>, JsError> {
        let store = JsStore { target: storage };
        let restored = self.session.restore(&store)?;
        self.store = Some(store);
        Ok(restored.then(|| self.session.document().html().to_string()))
    }

    /// Feed a new snapshot; `now_ms` is the host clock in milliseconds
    #[wasm_bindgen(js_name = applySnapshot)]
    pub fn apply_snapshot(&mut self, html: &str, now_ms: f64) -> JsValue {
        let diff = self.session.apply_snapshot(html, millis(now_ms));
        serde_wasm_bindgen::to_value(&diff).unwrap_or(JsValue::NULL)
    }

    /// Run the auto-save timer; returns whether the snapshot was written
    pub fn tick(&mut self, now_ms: f64) -> Result<bool, JsError> {
        match self.store.as_mut() {
            Some(store) => Ok(self.session.tick_autosave(store, millis(now_ms))?),
            None => Ok(false),
        }
    }

    #[wasm_bindgen(js_name = saveNow)]
    pub fn save_now(&mut self, now_ms: f64) -> Result<bool, JsError> {
        match self.store.as_mut() {
            Some(store) => Ok(self.session.save_now(store, millis(now_ms))?),
            None => Err(JsError::new("no storage attached")),
        }
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.session.page_count()
    }

    #[wasm_bindgen(js_name = getCharCount)]
    pub fn get_char_count(&self) -> usize {
        self.session.char_count()
    }

    /// Page assignment of the live view (returns JSON)
    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> JsValue {
        let pages: Vec<PageData> = self
            .session
            .pages()
            .iter()
            .map(|page| PageData {
                index: page.index,
                block_count: page.blocks.len(),
                html: page.blocks.iter().map(|b| b.html.as_str()).collect(),
                header_text: page.header_text.clone(),
                footer_text: page.footer_text.clone(),
            })
            .collect();
        serde_wasm_bindgen::to_value(&pages).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = getThumbnails)]
    pub fn get_thumbnails(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.session.thumbnails()).unwrap_or(JsValue::NULL)
    }

    /// Zoomed page box in CSS pixels (returns JSON)
    #[wasm_bindgen(js_name = getGeometry)]
    pub fn get_geometry(&self) -> JsValue {
        let geometry = self.session.geometry();
        let data = GeometryData {
            page_width: geometry.page_width(),
            page_height: geometry.page_height(),
            margin_top: geometry.margin_top(),
            margin_bottom: geometry.margin_bottom(),
            margin_left: geometry.margin_left(),
            margin_right: geometry.margin_right(),
            usable_width: geometry.usable_width(),
            usable_height: geometry.usable_height(),
            zoom: geometry.zoom(),
        };
        serde_wasm_bindgen::to_value(&data).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = getSettings)]
    pub fn get_settings(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.session.settings()).unwrap_or(JsValue::NULL)
    }

    /// Margins in millimetres; invalid margins are rejected and the old ones kept
    #[wasm_bindgen(js_name = setMargins)]
    pub fn set_margins(&mut self, top: f32, bottom: f32, left: f32, right: f32) -> Result<JsValue, JsError> {
        let diff = self.session.set_margins(Margins {
            top,
            bottom,
            left,
            right,
        })?;
        Ok(serde_wasm_bindgen::to_value(&diff).unwrap_or(JsValue::NULL))
    }

    #[wasm_bindgen(js_name = setPaper)]
    pub fn set_paper(&mut self, paper: JsValue) -> Result<JsValue, JsError> {
        let paper: PaperSize = serde_wasm_bindgen::from_value(paper)?;
        let diff = self.session.set_paper(paper)?;
        Ok(serde_wasm_bindgen::to_value(&diff).unwrap_or(JsValue::NULL))
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f32) -> Result<(), JsError> {
        self.session.set_zoom(zoom)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setWatermark)]
    pub fn set_watermark(&mut self, text: &str) {
        self.session.set_watermark(text);
    }

    #[wasm_bindgen(js_name = setShowHeaderFooter)]
    pub fn set_show_header_footer(&mut self, show: bool) -> Result<(), JsError> {
        self.session.set_show_header_footer(show)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = listTemplates)]
    pub fn list_templates() -> JsValue {
        serde_wasm_bindgen::to_value(templates::all()).unwrap_or(JsValue::NULL)
    }

    /// Load a template; returns its HTML for the editing engine
    #[wasm_bindgen(js_name = loadTemplate)]
    pub fn load_template(&mut self, id: &str, now_ms: f64) -> Result<String, JsError> {
        self.session.load_template(id, millis(now_ms))?;
        Ok(self.session.document().html().to_string())
    }

    #[wasm_bindgen(js_name = addComment)]
    pub fn add_comment(&mut self, from: usize, to: usize, text: &str, author: &str) -> Result<JsValue, JsError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| JsError::new("no editor attached"))?;
        let comment =
            self.session
                .add_comment(engine, TextRange::new(from, to), text, author, Utc::now())?;
        Ok(serde_wasm_bindgen::to_value(&comment).unwrap_or(JsValue::NULL))
    }

    #[wasm_bindgen(js_name = removeComment)]
    pub fn remove_comment(&mut self, id: &str) -> Result<(), JsError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| JsError::new("no editor attached"))?;
        self.session.remove_comment(engine, id)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = getComments)]
    pub fn get_comments(&self) -> JsValue {
        let comments: Vec<_> = self.session.comments().collect();
        serde_wasm_bindgen::to_value(&comments).unwrap_or(JsValue::NULL)
    }

    /// Comment ids marked in the document that have no comment
    #[wasm_bindgen(js_name = getOrphanMarks)]
    pub fn get_orphan_marks(&self) -> Vec<String> {
        self.session.orphan_marks().to_vec()
    }

    /// Strip orphaned comment marks through the editor; returns how many were cleared
    #[wasm_bindgen(js_name = clearOrphanMarks)]
    pub fn clear_orphan_marks(&mut self) -> Result<usize, JsError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| JsError::new("no editor attached"))?;
        Ok(self.session.clear_orphan_marks(engine)?)
    }

    #[wasm_bindgen(js_name = insertPageBreak)]
    pub fn insert_page_break(&mut self) -> Result<(), JsError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| JsError::new("no editor attached"))?;
        self.session.insert_page_break(engine)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleBlock)]
    pub fn toggle_block(&mut self, name: &str, level: Option<u8>) -> Result<(), JsError> {
        let toggle = toggle_from_name(name, level)
            .ok_or_else(|| JsError::new(&format!("unknown block type `{name}`")))?;
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| JsError::new("no editor attached"))?;
        engine.toggle_block(toggle)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = exportHtml)]
    pub fn export_html(&self, filename: Option<String>) -> Result<WasmArtifact, JsError> {
        let mut job = self.session.export_job(ExportFormat::Html);
        job.filename = filename;
        let artifact = export::html::export(self.session.document(), &job)?;
        Ok(WasmArtifact { artifact })
    }

    #[wasm_bindgen(js_name = exportDocx)]
    pub fn export_docx(&self, filename: Option<String>) -> Result<WasmArtifact, JsError> {
        let mut job = self.session.export_job(ExportFormat::Docx);
        job.filename = filename;
        let artifact = export::docx::export(self.session.document(), &job)?;
        Ok(WasmArtifact { artifact })
    }

    /// Start a PDF export rendered page by page by the host.
    /// With `strict`, the first failed page aborts the job.
    #[wasm_bindgen(js_name = beginPdfExport)]
    pub fn begin_pdf_export(&self, filename: Option<String>, strict: bool) -> Result<WasmPdfExport, JsError> {
        let mut job = self.session.export_job(ExportFormat::Pdf);
        job.filename = filename;
        if strict {
            job.failure_policy = FailurePolicy::AbortJob;
        }
        let export = self.session.begin_pdf_export(job)?;
        Ok(WasmPdfExport {
            export: Some(export),
        })
    }
}

/// A PDF export driven by the host: render `nextPageHtml()` with the
/// stylesheet, then hand back the PNG with `submitPng()`
#[wasm_bindgen]
pub struct WasmPdfExport {
    export: Option<PdfExport>,
}

impl WasmPdfExport {
    fn inner(&mut self) -> Result<&mut PdfExport, JsError> {
        self.export
            .as_mut()
            .ok_or_else(|| JsError::new("export already finished"))
    }
}

#[wasm_bindgen]
impl WasmPdfExport {
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.export.as_ref().map_or(0, PdfExport::page_count)
    }

    pub fn remaining(&self) -> usize {
        self.export.as_ref().map_or(0, PdfExport::remaining)
    }

    /// Markup of the page waiting to be rendered
    #[wasm_bindgen(js_name = nextPageHtml)]
    pub fn next_page_html(&self) -> Option<String> {
        self.export
            .as_ref()
            .and_then(PdfExport::next_fragment)
            .map(|fragment| fragment.to_html())
    }

    /// Stylesheet for the page markup
    pub fn stylesheet(&self) -> Option<String> {
        self.export
            .as_ref()
            .and_then(PdfExport::next_fragment)
            .map(|fragment| export_stylesheet(&fragment.geometry))
    }

    /// Supersampling factor the host should render at
    pub fn scale(&self) -> f32 {
        self.export
            .as_ref()
            .map_or(crate::render::EXPORT_SCALE, |export| export.raster_spec().scale)
    }

    #[wasm_bindgen(js_name = submitPng)]
    pub fn submit_png(&mut self, png: &[u8]) -> Result<(), JsError> {
        let image = decode_png(png);
        self.inner()?.submit(image)?;
        Ok(())
    }

    /// Report that the host could not render the next page
    #[wasm_bindgen(js_name = failPage)]
    pub fn fail_page(&mut self, reason: &str) -> Result<(), JsError> {
        self.inner()?
            .submit(Err(RasterError::Host(reason.to_string())))?;
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(export) = &self.export {
            export.cancellation_token().cancel();
        }
    }

    pub fn finish(&mut self) -> Result<WasmArtifact, JsError> {
        let export = self
            .export
            .take()
            .ok_or_else(|| JsError::new("export already finished"))?;
        Ok(WasmArtifact {
            artifact: export.finish()?,
        })
    }
}

/// A finished export for download
#[wasm_bindgen]
pub struct WasmArtifact {
    artifact: ExportArtifact,
}

#[wasm_bindgen]
impl WasmArtifact {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.artifact.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.artifact.mime.to_string()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.artifact.bytes.clone()
    }

    #[wasm_bindgen(js_name = isPartial)]
    pub fn is_partial(&self) -> bool {
        self.artifact.is_partial()
    }

    #[wasm_bindgen(js_name = skippedPages)]
    pub fn skipped_pages(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.artifact.skipped_pages).unwrap_or(JsValue::NULL)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageData {
    index: usize,
    block_count: usize,
    html: String,
    header_text: Option<String>,
    footer_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeometryData {
    page_width: f32,
    page_height: f32,
    margin_top: f32,
    margin_bottom: f32,
    margin_left: f32,
    margin_right: f32,
    usable_width: f32,
    usable_height: f32,
    zoom: f32,
}

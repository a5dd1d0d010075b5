//! Legalpad: paginated document core for a browser-hosted legal editor
//!
//! This crate turns the editing engine's HTML snapshots into fixed-size pages:
//! - Page geometry from paper size, margins and zoom
//! - Measured, cached pagination with explicit page breaks
//! - Thumbnail previews for the navigation panel
//! - PDF, DOCX and HTML export
//! - Comments, templates and debounced auto-save

pub mod comments;
pub mod config;
pub mod document;
pub mod editing;
pub mod error;
pub mod export;
pub mod layout;
pub mod preview;
pub mod render;
pub mod storage;
pub mod templates;
pub mod wasm;

use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};

// Re-export WASM types for direct use
pub use wasm::{WasmPdfExport, WasmSession};

// Re-export primary types
pub use comments::{Comment, CommentStore};
pub use config::EditorSettings;
pub use document::{Block, BlockKind, Document, Mark};
pub use editing::{BlockToggle, EditorCommands, MarkLedger, TextRange};
pub use error::{Error, Result};
pub use export::{ExportArtifact, ExportFormat, ExportJob, FailurePolicy, PdfExport};
pub use layout::{
    LayoutState, Margins, Measurer, MetricsMeasurer, Page, PageGeometry, PageGeometryConfig,
    PaginationDiff, PaperSize,
};
pub use preview::{PreviewRenderer, ThumbnailPage};
pub use render::{DraftRasterizer, Rasterizer};
pub use storage::{AutoSave, KeyValueStore, MemoryStore};

/// The document session combining all components
pub struct Session {
    document: Document,
    settings: EditorSettings,
    layout: LayoutState,
    measurer: Box<dyn Measurer>,
    preview: PreviewRenderer,
    thumbnails: Vec<ThumbnailPage>,
    comments: CommentStore,
    /// Comment marks in the document with no store entry
    orphan_marks: Vec<String>,
    autosave: AutoSave,
}

impl Session {
    /// Create an empty session; fails if the settings describe no usable page
    pub fn new(settings: EditorSettings, measurer: Box<dyn Measurer>) -> Result<Self> {
        let geometry = PageGeometry::new(&settings.geometry_config())?;
        let mut layout = LayoutState::new(geometry);
        layout.set_header_footer(settings.header_footer());

        let mut session = Self {
            document: Document::new(),
            settings,
            layout,
            measurer,
            preview: PreviewRenderer::new(),
            thumbnails: Vec::new(),
            comments: CommentStore::new(),
            orphan_marks: Vec::new(),
            autosave: AutoSave::default(),
        };
        session.relayout();
        Ok(session)
    }

    /// Session with default settings and the built-in font-metrics measurer
    pub fn with_defaults() -> Result<Self> {
        Self::new(EditorSettings::default(), Box::new(MetricsMeasurer::new()))
    }

    /// Load the saved snapshot, if any. Returns whether one was found.
    pub fn restore(&mut self, store: &dyn KeyValueStore) -> Result<bool> {
        match self.autosave.restore(store)? {
            Some(html) => {
                self.document.replace(&html);
                self.reconcile_comments();
                self.relayout();
                info!("restored {} blocks from storage", self.document.blocks().len());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Take a new snapshot from the editing engine
    pub fn apply_snapshot(&mut self, html: &str, now: Duration) -> PaginationDiff {
        self.document.replace(html);
        self.autosave.record(html, now);
        self.reconcile_comments();
        self.relayout()
    }

    /// Bring the comment store and the document's comment marks back in line:
    /// entries whose text was deleted are dropped, marks without an entry are
    /// collected for [`Session::clear_orphan_marks`]
    fn reconcile_comments(&mut self) {
        for orphan in self.comments.reconcile(&self.document) {
            info!("dropped comment {} whose text was deleted", orphan.id);
        }
        self.orphan_marks = self.comments.unanchored_marks(&self.document);
        if !self.orphan_marks.is_empty() {
            warn!("document carries comment marks with no entry: {:?}", self.orphan_marks);
        }
    }

    /// Replace the document with a built-in template
    pub fn load_template(&mut self, id: &str, now: Duration) -> Result<PaginationDiff> {
        let template =
            templates::find(id).ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;
        info!("loading template {}", template.name);
        Ok(self.apply_snapshot(template.html, now))
    }

    pub fn set_margins(&mut self, margins: Margins) -> Result<PaginationDiff> {
        self.update_geometry(|settings| settings.margins = margins)
    }

    pub fn set_paper(&mut self, paper: PaperSize) -> Result<PaginationDiff> {
        self.update_geometry(|settings| settings.paper = paper)
    }

    /// Change the display zoom. Page breaks are unaffected.
    pub fn set_zoom(&mut self, zoom: f32) -> Result<PaginationDiff> {
        self.update_geometry(|settings| settings.zoom = zoom)
    }

    pub fn set_show_header_footer(&mut self, show: bool) -> Result<PaginationDiff> {
        self.update_geometry(|settings| settings.show_header_footer = show)
    }

    /// Change the watermark text; it overlays pages and never moves breaks
    pub fn set_watermark(&mut self, text: &str) {
        self.settings.watermark_text = text.to_string();
    }

    pub fn set_header_text(&mut self, header: &str, footer: &str) {
        self.settings.header_text = header.to_string();
        self.settings.footer_text = footer.to_string();
        self.layout.set_header_footer(self.settings.header_footer());
    }

    /// Apply a settings change, keeping the previous geometry if it is invalid
    fn update_geometry(&mut self, change: impl FnOnce(&mut EditorSettings)) -> Result<PaginationDiff> {
        let mut candidate = self.settings.clone();
        change(&mut candidate);
        let geometry = PageGeometry::new(&candidate.geometry_config()).map_err(|err| {
            warn!("rejected page settings: {err}");
            err
        })?;

        self.settings = candidate;
        self.layout.set_geometry(geometry);
        self.layout.set_header_footer(self.settings.header_footer());
        Ok(self.relayout())
    }

    fn relayout(&mut self) -> PaginationDiff {
        let diff = self.layout.relayout(&self.document, &*self.measurer);
        self.thumbnails = self.preview.render(self.document.blocks(), &*self.measurer);
        diff
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &PageGeometry {
        self.layout.geometry()
    }

    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    pub fn pages(&self) -> &[Page] {
        self.layout.pages()
    }

    pub fn thumbnails(&self) -> &[ThumbnailPage] {
        &self.thumbnails
    }

    /// Characters in the document, shown next to the page count
    pub fn char_count(&self) -> usize {
        self.document.char_count()
    }

    /// Anchor a comment on the selection through the editing engine
    pub fn add_comment(
        &mut self,
        engine: &mut dyn EditorCommands,
        selection: TextRange,
        text: &str,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        Ok(self.comments.add(engine, selection, text, author, now)?.clone())
    }

    pub fn remove_comment(&mut self, engine: &mut dyn EditorCommands, id: &str) -> Result<Comment> {
        Ok(self.comments.remove(engine, id)?)
    }

    /// Comments in the order they were added
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    /// Ids of comment marks in the current snapshot that have no comment
    pub fn orphan_marks(&self) -> &[String] {
        &self.orphan_marks
    }

    /// Ask the editing engine to strip every orphaned comment mark.
    /// Marks the engine refused stay listed.
    pub fn clear_orphan_marks(&mut self, engine: &mut dyn EditorCommands) -> Result<usize> {
        let mut cleared = 0;
        let mut first_error = None;
        self.orphan_marks.retain(|id| {
            match engine.clear_mark(&Mark::Comment { id: id.clone() }) {
                Ok(()) => {
                    cleared += 1;
                    false
                }
                Err(err) => {
                    warn!("could not clear comment mark {id}: {err}");
                    first_error.get_or_insert(err);
                    true
                }
            }
        });
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(cleared),
        }
    }

    /// Ask the editing engine to insert an explicit page break. The layout
    /// follows with the next snapshot.
    pub fn insert_page_break(&self, engine: &mut dyn EditorCommands) -> Result<()> {
        Ok(engine.insert_page_break()?)
    }

    /// Write the pending snapshot once its quiet period has passed
    pub fn tick_autosave(&mut self, store: &mut dyn KeyValueStore, now: Duration) -> Result<bool> {
        Ok(self.autosave.poll(store, now)?)
    }

    /// Write the pending snapshot immediately
    pub fn save_now(&mut self, store: &mut dyn KeyValueStore, now: Duration) -> Result<bool> {
        Ok(self.autosave.flush(store, now)?)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Export job snapshotting the current settings
    pub fn export_job(&self, format: ExportFormat) -> ExportJob {
        let mut job = ExportJob::new(format, self.settings.geometry_config())
            .with_watermark(self.settings.watermark_text.clone());
        if let Some(header_footer) = self.settings.header_footer() {
            job = job.with_header_footer(header_footer);
        }
        job
    }

    /// Start a page-by-page PDF export driven by the host
    pub fn begin_pdf_export(&self, job: ExportJob) -> Result<PdfExport> {
        Ok(PdfExport::prepare(&self.document, job, &*self.measurer)?)
    }

    /// Run an export to completion
    pub fn export(&self, job: ExportJob, rasterizer: &mut dyn Rasterizer) -> Result<ExportArtifact> {
        Ok(export::export(&self.document, job, &*self.measurer, rasterizer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedMeasurer;

    fn new_session(height: f32) -> Session {
        Session::new(EditorSettings::default(), Box::new(FixedMeasurer::new(height))).unwrap()
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_create_session() {
        let session = Session::with_defaults().unwrap();
        assert_eq!(session.page_count(), 1);
        assert_eq!(session.char_count(), 0);
        assert_eq!(session.thumbnails().len(), 1);
    }

    #[test]
    fn test_snapshot_paginates() {
        let mut session = new_session(400.0);
        let diff = session.apply_snapshot("<p>a</p><p>b</p><p>c</p>", ms(0));
        // Usable A4 height is ~933px, so two 400px blocks per page
        assert_eq!(diff.page_count, 2);
        assert_eq!(session.pages()[0].blocks.len(), 2);
        assert!(session.has_unsaved_changes());
    }

    #[test]
    fn test_invalid_margins_keep_geometry() {
        let mut session = new_session(10.0);
        let before = *session.geometry();
        let err = session.set_margins(Margins::uniform(200.0)).unwrap_err();
        assert!(matches!(err, Error::Geometry(_)));
        assert_eq!(*session.geometry(), before);
        assert_eq!(session.settings().margins, Margins::default());
    }

    #[test]
    fn test_zoom_does_not_move_breaks() {
        let mut session = new_session(300.0);
        session.apply_snapshot(&"<p>x</p>".repeat(7), ms(0));
        let pages = session.pages().to_vec();
        session.set_zoom(1.25).unwrap();
        assert_eq!(session.pages(), pages.as_slice());
        assert_eq!(session.geometry().zoom(), 1.25);
    }

    #[test]
    fn test_header_footer_toggle() {
        let mut session = new_session(10.0);
        session.apply_snapshot("<p>a</p><div class=\"page-break\"></div><p>b</p>", ms(0));
        session.set_show_header_footer(true).unwrap();
        assert_eq!(session.pages()[1].footer_text.as_deref(), Some("Page 2"));
        session.set_show_header_footer(false).unwrap();
        assert!(session.pages()[1].footer_text.is_none());
    }

    #[test]
    fn test_load_template() {
        let mut session = Session::with_defaults().unwrap();
        session.load_template("contract", ms(0)).unwrap();
        assert!(session.document().plain_text().contains("LEGAL CONTRACT"));
        assert!(matches!(
            session.load_template("lease", ms(0)),
            Err(Error::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_autosave_and_restore() {
        let mut store = MemoryStore::new();
        let mut session = new_session(10.0);
        session.apply_snapshot("<p>draft</p>", ms(0));
        assert!(!session.tick_autosave(&mut store, ms(1000)).unwrap());
        assert!(session.tick_autosave(&mut store, ms(3000)).unwrap());

        let mut restored = new_session(10.0);
        assert!(restored.restore(&store).unwrap());
        assert_eq!(restored.document().plain_text(), "draft");
    }

    #[test]
    fn test_comment_lifecycle() {
        let mut session = new_session(10.0);
        let mut engine = MarkLedger::new(20);
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        let comment = session
            .add_comment(&mut engine, TextRange::new(2, 8), "check this", "Ann", now)
            .unwrap();
        assert_eq!(comment.id, "comment-1700000000000");
        assert!(engine.has_mark(&comment.mark()));

        // The snapshot carrying the mark keeps the comment
        session.apply_snapshot(
            r#"<p>a <span data-comment-id="comment-1700000000000">clause</span></p>"#,
            ms(0),
        );
        assert_eq!(session.comments().count(), 1);

        session.remove_comment(&mut engine, &comment.id).unwrap();
        assert_eq!(session.comments().count(), 0);
        assert!(!engine.has_mark(&comment.mark()));
    }

    #[test]
    fn test_restore_reports_unanchored_marks() {
        let mut store = MemoryStore::new();
        store
            .set(
                storage::STORAGE_KEY,
                r#"<p>See <span data-comment-id="comment-1" class="comment-highlight">this</span></p>"#,
            )
            .unwrap();

        let mut session = new_session(10.0);
        assert!(session.restore(&store).unwrap());
        assert_eq!(session.comments().count(), 0);
        assert_eq!(session.orphan_marks(), ["comment-1".to_string()]);

        let mut engine = MarkLedger::new(20);
        let mark = Mark::Comment {
            id: "comment-1".into(),
        };
        engine.apply_mark(&mark, TextRange::new(4, 8)).unwrap();
        assert_eq!(session.clear_orphan_marks(&mut engine).unwrap(), 1);
        assert!(!engine.has_mark(&mark));
        assert!(session.orphan_marks().is_empty());
    }

    #[test]
    fn test_snapshot_with_readded_mark_is_flagged() {
        let mut session = new_session(10.0);
        let mut engine = MarkLedger::new(20);
        let now = DateTime::from_timestamp_millis(5).unwrap();
        let comment = session
            .add_comment(&mut engine, TextRange::new(0, 4), "note", "Ann", now)
            .unwrap();
        session.remove_comment(&mut engine, &comment.id).unwrap();

        // An undo in the editor brings the mark back without its entry
        session.apply_snapshot(
            &format!(r#"<p><span data-comment-id="{}">text</span></p>"#, comment.id),
            ms(0),
        );
        assert_eq!(session.orphan_marks(), [comment.id.clone()]);

        session.apply_snapshot("<p>text</p>", ms(10));
        assert!(session.orphan_marks().is_empty());
    }

    #[test]
    fn test_export_job_snapshots_settings() {
        let mut session = new_session(10.0);
        session.set_watermark("DRAFT");
        let job = session.export_job(ExportFormat::Pdf);
        session.set_watermark("FINAL");
        assert_eq!(job.watermark_text, "DRAFT");
        assert!(job.header_footer.is_none());
    }
}

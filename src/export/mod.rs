//! Export pipeline: PDF, DOCX and HTML artifacts

pub mod docx;
pub mod html;
pub mod pdf;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::document::Document;
use crate::layout::{GeometryError, HeaderFooter, Measurer, PageGeometryConfig};
use crate::render::{RasterError, Rasterizer};

pub use pdf::{PdfExport, StepOutcome};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no page could be rendered; nothing to export")]
    NoPages,
    #[error("export was cancelled")]
    Cancelled,
    #[error("page {} failed to render", .page + 1)]
    Raster {
        page: usize,
        #[source]
        source: RasterError,
    },
    #[error("{remaining} pages are still waiting to be rendered")]
    Incomplete { remaining: usize },
    #[error("invalid page geometry: {0}")]
    Geometry(#[from] GeometryError),
    #[error("PDF assembly failed: {0}")]
    Pdf(String),
    #[error("DOCX packaging failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::Pdf(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Html => "text/html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "html" | "htm" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format `{other}` (expected pdf, docx or html)")),
        }
    }
}

/// What to do when a single page fails to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave the page out and report it on the artifact
    #[default]
    SkipPage,
    /// Fail the whole job
    AbortJob,
}

/// Snapshot of everything an export needs; later settings changes do not
/// affect a job once built
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub geometry: PageGeometryConfig,
    pub header_footer: Option<HeaderFooter>,
    pub watermark_text: String,
    pub filename: Option<String>,
    pub failure_policy: FailurePolicy,
}

impl ExportJob {
    pub fn new(format: ExportFormat, geometry: PageGeometryConfig) -> Self {
        Self {
            format,
            geometry,
            header_footer: None,
            watermark_text: String::new(),
            filename: None,
            failure_policy: FailurePolicy::default(),
        }
    }

    pub fn with_header_footer(mut self, header_footer: HeaderFooter) -> Self {
        self.header_footer = Some(header_footer);
        self
    }

    pub fn with_watermark(mut self, text: impl Into<String>) -> Self {
        self.watermark_text = text.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Caller-supplied filename with the extension ensured, or the dated default
    pub fn resolved_filename(&self, today: NaiveDate) -> String {
        let ext = self.format.extension();
        match self.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let suffix = format!(".{ext}");
                if name.to_ascii_lowercase().ends_with(&suffix) {
                    name.to_string()
                } else {
                    format!("{name}{suffix}")
                }
            }
            _ => default_filename(self.format, today),
        }
    }
}

/// `document-YYYY-MM-DD.<ext>`
pub fn default_filename(format: ExportFormat, today: NaiveDate) -> String {
    format!("document-{}.{}", today.format("%Y-%m-%d"), format.extension())
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// A page left out of a partial PDF
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPage {
    pub index: usize,
    pub reason: String,
}

/// A finished export, ready to be saved or downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// Pages in the artifact; zero for flowing formats
    pub page_count: usize,
    pub skipped_pages: Vec<SkippedPage>,
}

impl ExportArtifact {
    /// True when some pages were left out
    pub fn is_partial(&self) -> bool {
        !self.skipped_pages.is_empty()
    }
}

/// Shared flag to stop a running export between pages
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Run an export job to completion
pub fn export(
    document: &Document,
    job: ExportJob,
    measurer: &dyn Measurer,
    rasterizer: &mut dyn Rasterizer,
) -> Result<ExportArtifact, ExportError> {
    match job.format {
        ExportFormat::Pdf => PdfExport::prepare(document, job, measurer)?.run(rasterizer),
        ExportFormat::Docx => docx::export(document, &job),
        ExportFormat::Html => html::export(document, &job),
    }
}

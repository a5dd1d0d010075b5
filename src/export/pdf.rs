//! PDF export: one full-page raster per page, appended in document order,
//! with an optional text layer written over it

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use log::{debug, info, warn};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream, StringFormat};

use crate::document::Document;
use crate::export::{
    today, CancellationToken, ExportArtifact, ExportError, ExportFormat, ExportJob, FailurePolicy,
    SkippedPage,
};
use crate::layout::{paginate, px_to_pt, Measurer, PageGeometry};
use crate::render::{
    build_fragments, PageFragment, RasterError, RasterSpec, Rasterizer, TextLine, TextStyle,
    EXPORT_SCALE,
};

/// Result of advancing an export by one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The page at this index was appended
    Appended(usize),
    /// The page at this index failed and was left out
    Skipped(usize),
    /// Every page has been processed
    Done,
}

/// A cooperative, page-at-a-time PDF export.
///
/// The host either calls [`PdfExport::step`] with a rasterizer, or pulls
/// [`PdfExport::next_fragment`] and hands the rendered bitmap back through
/// [`PdfExport::submit`] when rasterization happens asynchronously.
pub struct PdfExport {
    job: ExportJob,
    fragments: Vec<PageFragment>,
    next: usize,
    spec: RasterSpec,
    writer: PdfImageWriter,
    skipped: Vec<SkippedPage>,
    cancel: CancellationToken,
}

impl PdfExport {
    /// Paginate with export geometry and build one fragment per page
    pub fn prepare(
        document: &Document,
        job: ExportJob,
        measurer: &dyn Measurer,
    ) -> Result<Self, ExportError> {
        let geometry = PageGeometry::for_export(&job.geometry)?;
        let pages = paginate(document.blocks(), &geometry, measurer);
        let fragments = build_fragments(
            &pages,
            &geometry,
            job.header_footer.as_ref(),
            &job.watermark_text,
        );
        info!("PDF export prepared: {} pages", fragments.len());

        let (width, height) = geometry.layout_page_size();
        Ok(Self {
            writer: PdfImageWriter::new(px_to_pt(width), px_to_pt(height)),
            spec: RasterSpec::for_geometry(&geometry, EXPORT_SCALE),
            job,
            fragments,
            next: 0,
            skipped: Vec::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Use an externally held cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Pages planned for this export
    pub fn page_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn remaining(&self) -> usize {
        self.fragments.len() - self.next
    }

    pub fn raster_spec(&self) -> &RasterSpec {
        &self.spec
    }

    /// The page waiting to be rendered
    pub fn next_fragment(&self) -> Option<&PageFragment> {
        self.fragments.get(self.next)
    }

    /// Render the next page with `rasterizer`, resetting it afterwards
    pub fn step(&mut self, rasterizer: &mut dyn Rasterizer) -> Result<StepOutcome, ExportError> {
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let Some(fragment) = self.fragments.get(self.next) else {
            return Ok(StepOutcome::Done);
        };
        let text = rasterizer.text_layer(fragment);
        let result = rasterizer.rasterize(fragment, &self.spec);
        rasterizer.reset();
        self.accept(result, &text)
    }

    /// Accept the rendering of the next page
    pub fn submit(
        &mut self,
        result: Result<RgbaImage, RasterError>,
    ) -> Result<StepOutcome, ExportError> {
        self.accept(result, &[])
    }

    fn accept(
        &mut self,
        result: Result<RgbaImage, RasterError>,
        text: &[TextLine],
    ) -> Result<StepOutcome, ExportError> {
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let Some(fragment) = self.fragments.get(self.next) else {
            return Ok(StepOutcome::Done);
        };
        let index = fragment.page_index;
        self.next += 1;

        let image = result.and_then(|image| match image.dimensions() {
            (0, _) | (_, 0) => Err(RasterError::InvalidSize {
                width: image.width(),
                height: image.height(),
            }),
            _ => Ok(image),
        });

        match image {
            Ok(image) => {
                self.writer.append_page(&image, text)?;
                debug!("appended page {} of {}", index + 1, self.fragments.len());
                Ok(StepOutcome::Appended(index))
            }
            Err(err) => match self.job.failure_policy {
                FailurePolicy::SkipPage => {
                    warn!("skipping page {}: {err}", index + 1);
                    self.skipped.push(SkippedPage {
                        index,
                        reason: err.to_string(),
                    });
                    Ok(StepOutcome::Skipped(index))
                }
                FailurePolicy::AbortJob => Err(ExportError::Raster {
                    page: index,
                    source: err,
                }),
            },
        }
    }

    /// Render every remaining page and finish
    pub fn run(mut self, rasterizer: &mut dyn Rasterizer) -> Result<ExportArtifact, ExportError> {
        while self.step(rasterizer)? != StepOutcome::Done {}
        self.finish()
    }

    /// Assemble the document. Fails if pages are still pending or none rendered.
    pub fn finish(self) -> Result<ExportArtifact, ExportError> {
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        if self.remaining() > 0 {
            return Err(ExportError::Incomplete {
                remaining: self.remaining(),
            });
        }
        let page_count = self.writer.page_count();
        if page_count == 0 {
            return Err(ExportError::NoPages);
        }

        let bytes = self.writer.finish()?;
        let filename = self.job.resolved_filename(today());
        info!(
            "PDF export finished: {filename}, {page_count} pages, {} skipped, {} bytes",
            self.skipped.len(),
            bytes.len()
        );
        Ok(ExportArtifact {
            filename,
            mime: ExportFormat::Pdf.mime_type(),
            bytes,
            page_count,
            skipped_pages: self.skipped,
        })
    }
}

/// Builds a PDF whose pages each hold a single full-page image and the
/// page's text layer, if any
struct PdfImageWriter {
    document: PdfDocument,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    width_pt: f32,
    height_pt: f32,
}

impl PdfImageWriter {
    fn new(width_pt: f32, height_pt: f32) -> Self {
        let mut document = PdfDocument::with_version("1.7");
        let pages_id = document.new_object_id();
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            document,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            width_pt,
            height_pt,
        }
    }

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn append_page(&mut self, image: &RgbaImage, text: &[TextLine]) -> Result<(), ExportError> {
        let (width, height) = image.dimensions();

        // Flatten alpha onto white paper
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = a as u32;
            for channel in [r, g, b] {
                rgb.push(((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8);
            }
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        let compressed = encoder.finish()?;

        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        let image_id = self.document.add_object(image_stream);

        let mut content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        self.width_pt.into(),
                        0.into(),
                        0.into(),
                        self.height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        for line in text {
            self.push_text(&mut content, line);
        }
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), self.width_pt.into(), self.height_pt.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
                "Font" => dictionary! { "F1" => self.font_id },
            },
        };
        let page_id = self.document.add_object(page_dict);
        self.page_ids.push(page_id);
        Ok(())
    }

    fn push_text(&self, content: &mut Content, line: &TextLine) {
        let x = px_to_pt(line.x);
        let y = self.height_pt - px_to_pt(line.y);
        let size = px_to_pt(line.font_size);
        let (gray, matrix): (f32, [f32; 6]) = match line.style {
            TextStyle::Body => (0.0, [1.0, 0.0, 0.0, 1.0, x, y]),
            TextStyle::Chrome => (0.2, [1.0, 0.0, 0.0, 1.0, x, y]),
            TextStyle::Watermark => {
                // Rising at 45 degrees, centred on (x, y)
                let d = std::f32::consts::FRAC_1_SQRT_2;
                let half = size * 0.55 * line.text.chars().count() as f32 / 2.0;
                (0.9, [d, d, -d, d, x - half * d, y - half * d])
            }
        };

        let ops = &mut content.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
        ops.push(Operation::new("g", vec![gray.into()]));
        ops.push(Operation::new("Tm", matrix.iter().map(|v| (*v).into()).collect()));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);
        let info_id = self.document.add_object(dictionary! {
            "Producer" => Object::string_literal("legalpad"),
        });
        self.document.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Encode text for the WinAnsi-encoded standard font; unmapped characters become `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => c as u8,
            _ => b'?',
        })
        .collect()
}

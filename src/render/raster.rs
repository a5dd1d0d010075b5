//! Rasterization of page fragments into bitmaps

use image::{ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::document::{BlockBody, BlockKind};
use crate::layout::{measure_or_min, Measurer, MetricsMeasurer, PageGeometry};
use crate::render::fragment::PageFragment;
use crate::render::text::{layout_text, TextLine};

/// Supersampling factor for export rasters
pub const EXPORT_SCALE: f32 = 2.0;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BORDER: Rgba<u8> = Rgba([204, 204, 204, 255]);
const IMAGE_FILL: Rgba<u8> = Rgba([220, 220, 220, 255]);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("rasterization surface is still attached to a previous page")]
    SurfaceBusy,
    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("page image could not be decoded: {0}")]
    Decode(String),
    #[error("host rasterizer failed: {0}")]
    Host(String),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        RasterError::Decode(err.to_string())
    }
}

/// Target size of a page raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSpec {
    /// Page width in CSS pixels
    pub width_px: u32,
    /// Page height in CSS pixels
    pub height_px: u32,
    /// Supersampling factor
    pub scale: f32,
}

impl RasterSpec {
    /// Spec for a full page at the given supersampling factor
    pub fn for_geometry(geometry: &PageGeometry, scale: f32) -> Self {
        let (width, height) = geometry.layout_page_size();
        Self {
            width_px: width.round() as u32,
            height_px: height.round() as u32,
            scale,
        }
    }

    pub fn for_fragment(fragment: &PageFragment, scale: f32) -> Self {
        Self::for_geometry(&fragment.geometry, scale)
    }

    /// Dimensions of the produced bitmap
    pub fn output_size(&self) -> (u32, u32) {
        (
            (self.width_px as f32 * self.scale).round() as u32,
            (self.height_px as f32 * self.scale).round() as u32,
        )
    }
}

/// Renders a page fragment into a bitmap
pub trait Rasterizer {
    fn rasterize(&mut self, fragment: &PageFragment, spec: &RasterSpec)
        -> Result<RgbaImage, RasterError>;

    /// Text to write over the bitmap. Empty when the bitmap already shows it.
    fn text_layer(&self, _fragment: &PageFragment) -> Vec<TextLine> {
        Vec::new()
    }

    /// Detach and clear the shared surface; called after every page
    fn reset(&mut self) {}
}

/// Decode PNG bytes produced by a host rasterizer
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, RasterError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8())
}

/// Built-in renderer for hosts without a browser surface. The bitmap holds
/// the page boxes (table borders, rules, image placeholders); the text is
/// supplied as a text layer and written as real text by the PDF writer.
pub struct DraftRasterizer {
    measurer: Box<dyn Measurer>,
    fonts: MetricsMeasurer,
    attached: bool,
}

impl Default for DraftRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftRasterizer {
    pub fn new() -> Self {
        Self::with_measurer(Box::new(MetricsMeasurer::new()))
    }

    pub fn with_measurer(measurer: Box<dyn Measurer>) -> Self {
        Self {
            measurer,
            fonts: MetricsMeasurer::new(),
            attached: false,
        }
    }

    fn draw_boxes(&self, canvas: &mut Canvas, fragment: &PageFragment) {
        let geometry = &fragment.geometry;
        let (top, bottom, left, _) = geometry.layout_margins();
        let (_, page_height) = geometry.layout_page_size();
        let width = geometry.layout_width();

        let mut y = top;
        for block in &fragment.blocks {
            if y > page_height - bottom {
                break;
            }
            let height = measure_or_min(self.measurer.as_ref(), block, width);
            let font_size = self.fonts.metrics_for(&block.kind).font_size;
            let spacing = block.kind.spacing() * font_size;
            let content_top = y + spacing / 2.0;
            let content = (height - spacing).max(0.0);

            match (&block.kind, &block.body) {
                (BlockKind::Table, _) => canvas.stroke_rect(left, content_top, width, content, BORDER),
                (BlockKind::Rule, _) => canvas.fill_rect(left, content_top, width, 1.0, BORDER),
                (_, BlockBody::Image { .. }) => {
                    canvas.fill_rect(left, content_top, width, content, IMAGE_FILL)
                }
                _ => {}
            }
            y += height;
        }
    }
}

impl Rasterizer for DraftRasterizer {
    fn rasterize(
        &mut self,
        fragment: &PageFragment,
        spec: &RasterSpec,
    ) -> Result<RgbaImage, RasterError> {
        if self.attached {
            return Err(RasterError::SurfaceBusy);
        }
        let (width, height) = spec.output_size();
        if width == 0 || height == 0 || !spec.scale.is_finite() || spec.scale <= 0.0 {
            return Err(RasterError::InvalidSize { width, height });
        }
        self.attached = true;

        let mut canvas = Canvas {
            image: RgbaImage::from_pixel(width, height, WHITE),
            scale: spec.scale,
        };
        self.draw_boxes(&mut canvas, fragment);
        Ok(canvas.image)
    }

    fn text_layer(&self, fragment: &PageFragment) -> Vec<TextLine> {
        layout_text(fragment, self.measurer.as_ref(), &self.fonts)
    }

    fn reset(&mut self) {
        self.attached = false;
    }
}

/// Bitmap addressed in CSS pixels
struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        let x0 = ((x * self.scale).max(0.0) as u32).min(width);
        let y0 = ((y * self.scale).max(0.0) as u32).min(height);
        let x1 = (((x + w) * self.scale).max(0.0).ceil() as u32).min(width);
        let y1 = (((y + h) * self.scale).max(0.0).ceil() as u32).min(height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        self.fill_rect(x, y, w, 1.0, color);
        self.fill_rect(x, y + h - 1.0, w, 1.0, color);
        self.fill_rect(x, y, 1.0, h, color);
        self.fill_rect(x + w - 1.0, y, 1.0, h, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document};
    use crate::layout::{HeaderFooter, Page, PageGeometry, PageGeometryConfig};
    use crate::render::fragment::build_fragments;

    fn fragment(watermark: &str) -> PageFragment {
        let geometry = PageGeometry::for_export(&PageGeometryConfig::default()).unwrap();
        let mut page = Page::new(0);
        page.blocks.push(Block::heading(1, "Agreement"));
        page.blocks.push(Block::paragraph(&"terms and conditions ".repeat(30)));
        build_fragments(&[page], &geometry, Some(&HeaderFooter::default()), watermark)
            .remove(0)
    }

    #[test]
    fn test_spec_output_size() {
        let spec = RasterSpec::for_fragment(&fragment(""), EXPORT_SCALE);
        assert_eq!((spec.width_px, spec.height_px), (794, 1123));
        assert_eq!(spec.output_size(), (1588, 2246));
    }

    #[test]
    fn test_draft_raster_draws_boxes() {
        let geometry = PageGeometry::for_export(&PageGeometryConfig::default()).unwrap();
        let doc = Document::from_html("<p>Parties</p><table><tr><td>A</td><td>B</td></tr></table><hr>");
        let mut page = Page::new(0);
        page.blocks = doc.blocks().to_vec();
        let boxed = build_fragments(&[page], &geometry, None, "").remove(0);

        let spec = RasterSpec::for_fragment(&boxed, 1.0);
        let image = DraftRasterizer::new().rasterize(&boxed, &spec).unwrap();
        assert_eq!(image.dimensions(), spec.output_size());
        assert_eq!(*image.get_pixel(5, 5), WHITE);
        assert!(image.pixels().filter(|p| **p == BORDER).count() > 500);
    }

    #[test]
    fn test_draft_text_layer_carries_page_text() {
        let fragment = fragment("DRAFT");
        let rasterizer = DraftRasterizer::new();
        let lines = rasterizer.text_layer(&fragment);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts[0], "DRAFT");
        assert!(texts.contains(&"Agreement"));
        assert!(texts.contains(&"Document Header"));
        assert!(texts.contains(&"Page 1"));
    }

    #[test]
    fn test_host_rasterizers_have_no_text_layer() {
        struct Blank;
        impl Rasterizer for Blank {
            fn rasterize(
                &mut self,
                _: &PageFragment,
                spec: &RasterSpec,
            ) -> Result<RgbaImage, RasterError> {
                let (w, h) = spec.output_size();
                Ok(RgbaImage::from_pixel(w, h, WHITE))
            }
        }
        assert!(Blank.text_layer(&fragment("DRAFT")).is_empty());
    }

    #[test]
    fn test_surface_must_be_reset() {
        let fragment = fragment("");
        let spec = RasterSpec::for_fragment(&fragment, 0.25);
        let mut rasterizer = DraftRasterizer::new();
        rasterizer.rasterize(&fragment, &spec).unwrap();
        assert_eq!(
            rasterizer.rasterize(&fragment, &spec),
            Err(RasterError::SurfaceBusy)
        );
        rasterizer.reset();
        assert!(rasterizer.rasterize(&fragment, &spec).is_ok());
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let fragment = fragment("");
        let spec = RasterSpec::for_fragment(&fragment, 0.0);
        assert_eq!(
            DraftRasterizer::new().rasterize(&fragment, &spec),
            Err(RasterError::InvalidSize {
                width: 0,
                height: 0
            })
        );
    }

    #[test]
    fn test_decode_png_rejects_garbage() {
        assert!(matches!(decode_png(b"not a png"), Err(RasterError::Decode(_))));
    }
}

//! Block measurement

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::document::{Block, BlockBody, BlockKind};
use crate::layout::font::FontMetrics;
use crate::layout::line_break::LineBreaker;

/// Height used for a block whose measurement failed
pub const MIN_BLOCK_HEIGHT: f32 = f32::MIN_POSITIVE;

/// Inner padding of table cells in CSS pixels
pub(crate) const CELL_PADDING: f32 = 8.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasureError {
    #[error("cannot measure at width {0}")]
    InvalidWidth(f32),
    #[error("block cannot be measured: {0}")]
    Unmeasurable(String),
    #[error("measurement surface failed: {0}")]
    Surface(String),
    #[error("measured height {0} is not a finite non-negative number")]
    InvalidHeight(f32),
}

/// Rendered height of a block at a given width, in CSS pixels
pub trait Measurer {
    fn measure(&self, block: &Block, width: f32) -> Result<f32, MeasureError>;
}

impl<M: Measurer + ?Sized> Measurer for Box<M> {
    fn measure(&self, block: &Block, width: f32) -> Result<f32, MeasureError> {
        (**self).measure(block, width)
    }
}

impl<M: Measurer + ?Sized> Measurer for &M {
    fn measure(&self, block: &Block, width: f32) -> Result<f32, MeasureError> {
        (**self).measure(block, width)
    }
}

/// Measure a block, rejecting heights that are not finite and non-negative
pub fn try_measure(measurer: &dyn Measurer, block: &Block, width: f32) -> Result<f32, MeasureError> {
    match measurer.measure(block, width)? {
        height if height.is_finite() && height >= 0.0 => Ok(height),
        height => Err(MeasureError::InvalidHeight(height)),
    }
}

/// Measure a block, substituting a minimal height on failure
pub fn measure_or_min(measurer: &dyn Measurer, block: &Block, width: f32) -> f32 {
    try_measure(measurer, block, width).unwrap_or_else(|err| {
        debug!("measurement of {:?} block failed: {err}; using minimal height", block.kind);
        MIN_BLOCK_HEIGHT
    })
}

/// Deterministic measurer driven by font metrics and greedy line breaking
#[derive(Debug, Clone, Default)]
pub struct MetricsMeasurer {
    body: FontMetrics,
    code: Option<FontMetrics>,
    line_breaker: LineBreaker,
}

impl MetricsMeasurer {
    pub fn new() -> Self {
        Self::with_metrics(FontMetrics::default())
    }

    pub fn with_metrics(body: FontMetrics) -> Self {
        Self {
            code: Some(FontMetrics::monospace(body.font_size * BlockKind::CodeBlock.font_scale())),
            body,
            line_breaker: LineBreaker::new(),
        }
    }

    pub fn body_metrics(&self) -> &FontMetrics {
        &self.body
    }

    /// Font metrics used for blocks of `kind`
    pub fn metrics_for(&self, kind: &BlockKind) -> FontMetrics {
        match (kind, &self.code) {
            (BlockKind::CodeBlock, Some(code)) => code.clone(),
            _ => self.body.scaled(kind.font_scale()),
        }
    }

    pub fn line_breaker(&self) -> &LineBreaker {
        &self.line_breaker
    }

    fn text_height(&self, text: &str, metrics: &FontMetrics, width: f32) -> f32 {
        self.line_breaker.line_count(text, metrics, width.max(1.0)) as f32 * metrics.line_height
    }
}

impl Measurer for MetricsMeasurer {
    fn measure(&self, block: &Block, width: f32) -> Result<f32, MeasureError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(MeasureError::InvalidWidth(width));
        }

        let kind = &block.kind;
        let metrics = self.metrics_for(kind);
        let spacing = kind.spacing() * metrics.font_size;
        let inner_width = width - kind.indent();

        let content = match &block.body {
            BlockBody::Empty => match kind {
                BlockKind::Rule => 2.0,
                _ => 0.0,
            },
            BlockBody::Inline => self.text_height(&block.text(), &metrics, inner_width),
            BlockBody::Items(items) => items
                .iter()
                .map(|item| self.text_height(item, &metrics, inner_width))
                .sum(),
            BlockBody::Rows(rows) => {
                let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
                let cell_width = width / columns as f32 - 2.0 * CELL_PADDING;
                rows.iter()
                    .map(|cells| {
                        let tallest = cells
                            .iter()
                            .map(|cell| self.text_height(cell, &metrics, cell_width))
                            .fold(metrics.line_height, f32::max);
                        tallest + 2.0 * CELL_PADDING
                    })
                    .sum()
            }
            BlockBody::Image { width: w, height: h } => match (w, h) {
                (Some(w), Some(h)) if *w > width => h * width / w,
                (_, Some(h)) => *h,
                _ => {
                    return Err(MeasureError::Unmeasurable(
                        "image without a declared height".into(),
                    ))
                }
            },
        };

        Ok(content + spacing)
    }
}

/// Measurer returning preset heights keyed by block text, for tests and
/// headless hosts
#[derive(Debug, Clone, Default)]
pub struct FixedMeasurer {
    default_height: f32,
    heights: FxHashMap<String, f32>,
    failing: FxHashSet<String>,
}

impl FixedMeasurer {
    pub fn new(default_height: f32) -> Self {
        Self {
            default_height,
            ..Default::default()
        }
    }

    /// Measure blocks whose text is `text` at `height`
    pub fn with_height(mut self, text: &str, height: f32) -> Self {
        self.heights.insert(text.to_string(), height);
        self
    }

    /// Fail measurement of blocks whose text is `text`
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }
}

impl Measurer for FixedMeasurer {
    fn measure(&self, block: &Block, _width: f32) -> Result<f32, MeasureError> {
        let text = block.text();
        if self.failing.contains(&text) {
            return Err(MeasureError::Surface(format!("no layout for {text:?}")));
        }
        Ok(self
            .heights
            .get(&text)
            .copied()
            .unwrap_or(self.default_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_paragraph_grows_with_text() {
        let measurer = MetricsMeasurer::new();
        let short = Block::paragraph("short");
        let long = Block::paragraph(&"lorem ipsum dolor sit amet ".repeat(40));
        let h_short = measurer.measure(&short, 600.0).unwrap();
        let h_long = measurer.measure(&long, 600.0).unwrap();
        assert!(h_long > h_short * 5.0);
    }

    #[test]
    fn test_narrower_is_taller() {
        let measurer = MetricsMeasurer::new();
        let block = Block::paragraph(&"words and more words ".repeat(20));
        assert!(measurer.measure(&block, 130.0).unwrap() > measurer.measure(&block, 600.0).unwrap());
    }

    #[test]
    fn test_heading_taller_than_paragraph() {
        let measurer = MetricsMeasurer::new();
        let h1 = measurer.measure(&Block::heading(1, "Title"), 600.0).unwrap();
        let p = measurer.measure(&Block::paragraph("Title"), 600.0).unwrap();
        assert!(h1 > p);
    }

    #[test]
    fn test_structured_blocks() {
        let measurer = MetricsMeasurer::new();
        let doc = Document::from_html(
            "<ul><li>a</li><li>b</li><li>c</li></ul>\
             <table><tr><td>1</td><td>2</td></tr><tr><td>3</td><td>4</td></tr></table>\
             <img src=\"a.png\" width=\"1200\" height=\"600\">\
             <img src=\"b.png\">",
        );
        let blocks = doc.blocks();
        let metrics = measurer.body_metrics();

        let list = measurer.measure(&blocks[0], 600.0).unwrap();
        assert!(list >= metrics.line_height * 3.0);

        let table = measurer.measure(&blocks[1], 600.0).unwrap();
        assert!(table >= 2.0 * (metrics.line_height + 2.0 * CELL_PADDING));

        // Scaled down to fit the width
        let image = measurer.measure(&blocks[2], 600.0).unwrap();
        assert_eq!(image, 300.0);

        assert!(matches!(
            measurer.measure(&blocks[3], 600.0),
            Err(MeasureError::Unmeasurable(_))
        ));
    }

    #[test]
    fn test_invalid_width() {
        let measurer = MetricsMeasurer::new();
        assert_eq!(
            measurer.measure(&Block::paragraph("x"), 0.0),
            Err(MeasureError::InvalidWidth(0.0))
        );
    }

    #[test]
    fn test_measure_or_min_recovers() {
        let measurer = FixedMeasurer::new(10.0).failing_on("bad").with_height("nan", f32::NAN);
        assert_eq!(measure_or_min(&measurer, &Block::paragraph("ok"), 100.0), 10.0);
        assert_eq!(
            measure_or_min(&measurer, &Block::paragraph("bad"), 100.0),
            MIN_BLOCK_HEIGHT
        );
        assert_eq!(
            measure_or_min(&measurer, &Block::paragraph("nan"), 100.0),
            MIN_BLOCK_HEIGHT
        );
    }
}

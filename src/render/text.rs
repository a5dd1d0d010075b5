//! Positioned text lines for pages drawn by the built-in renderer

use crate::document::{BlockBody, BlockKind};
use crate::layout::measure::CELL_PADDING;
use crate::layout::{measure_or_min, FontMetrics, Measurer, MetricsMeasurer};
use crate::render::fragment::PageFragment;

/// Header and footer font size in CSS pixels (10pt)
pub const CHROME_FONT_SIZE: f32 = 13.33;

/// Watermark font size: 4em of 12pt body text
pub const WATERMARK_FONT_SIZE: f32 = 64.0;

/// Distance from the top of a line box to its baseline, in ems
const ASCENT: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Body,
    /// Header, footer and page number
    Chrome,
    /// Diagonal text centred on the page
    Watermark,
}

/// One line of text, positioned in CSS pixels from the page's top-left corner
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    /// Baseline; for the watermark, the page centre
    pub y: f32,
    pub font_size: f32,
    pub style: TextStyle,
}

/// Lay out the text of a page fragment: watermark first, then content, then
/// header and footer. Block heights come from `measurer` so lines fall where
/// the paginator placed their blocks.
pub fn layout_text(
    fragment: &PageFragment,
    measurer: &dyn Measurer,
    fonts: &MetricsMeasurer,
) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let geometry = &fragment.geometry;
    let (top, bottom, left, right) = geometry.layout_margins();
    let (page_width, page_height) = geometry.layout_page_size();
    let width = geometry.layout_width();

    if let Some(text) = &fragment.watermark {
        lines.push(TextLine {
            text: text.clone(),
            x: page_width / 2.0,
            y: page_height / 2.0,
            font_size: WATERMARK_FONT_SIZE,
            style: TextStyle::Watermark,
        });
    }

    let mut y = top;
    for block in &fragment.blocks {
        if y > page_height - bottom {
            break;
        }
        let height = measure_or_min(measurer, block, width);
        let metrics = fonts.metrics_for(&block.kind);
        let content_top = y + block.kind.spacing() * metrics.font_size / 2.0;
        let x = left + block.kind.indent();
        let inner_width = width - block.kind.indent();
        let mut placer = LinePlacer {
            fonts,
            metrics: &metrics,
            lines: &mut lines,
        };

        match &block.body {
            BlockBody::Inline => {
                placer.wrap(&block.text(), x, content_top, inner_width);
            }
            BlockBody::Items(items) => {
                let ordered = matches!(block.kind, BlockKind::List { ordered: true });
                let mut line_top = content_top;
                for (i, item) in items.iter().enumerate() {
                    let marker = if ordered {
                        format!("{}.", i + 1)
                    } else {
                        "\u{2022}".to_string()
                    };
                    placer.place(marker, x - 20.0, line_top);
                    line_top += placer.wrap(item, x, line_top, inner_width);
                }
            }
            BlockBody::Rows(rows) => {
                let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
                let column_width = width / columns as f32;
                let mut row_top = content_top;
                for cells in rows {
                    let mut tallest = metrics.line_height;
                    for (c, cell) in cells.iter().enumerate() {
                        let cell_x = left + c as f32 * column_width + CELL_PADDING;
                        let used = placer.wrap(
                            cell,
                            cell_x,
                            row_top + CELL_PADDING,
                            column_width - 2.0 * CELL_PADDING,
                        );
                        tallest = tallest.max(used);
                    }
                    row_top += tallest + 2.0 * CELL_PADDING;
                }
            }
            BlockBody::Image { .. } | BlockBody::Empty => {}
        }
        y += height;
    }

    let chrome = FontMetrics::sans_serif(CHROME_FONT_SIZE);
    let usable = page_width - left - right;
    let centred = |text: &str| left + (usable - chrome.text_width(text).min(usable)) / 2.0;
    if let Some(header) = &fragment.header {
        lines.push(TextLine {
            text: header.clone(),
            x: centred(header),
            y: top / 2.0,
            font_size: CHROME_FONT_SIZE,
            style: TextStyle::Chrome,
        });
    }
    if let Some(footer) = &fragment.footer {
        let text = format!("{footer} {}", fragment.page_number());
        lines.push(TextLine {
            x: centred(&text),
            text,
            y: page_height - bottom / 2.0,
            font_size: CHROME_FONT_SIZE,
            style: TextStyle::Chrome,
        });
    }

    lines
}

struct LinePlacer<'a> {
    fonts: &'a MetricsMeasurer,
    metrics: &'a FontMetrics,
    lines: &'a mut Vec<TextLine>,
}

impl LinePlacer<'_> {
    /// Place one line whose box starts at `line_top`
    fn place(&mut self, text: String, x: f32, line_top: f32) {
        let leading = (self.metrics.line_height - self.metrics.font_size) / 2.0;
        self.lines.push(TextLine {
            text,
            x,
            y: line_top + leading + self.metrics.font_size * ASCENT,
            font_size: self.metrics.font_size,
            style: TextStyle::Body,
        });
    }

    /// Wrap `text` to `max_width` and place its lines; returns the height used
    fn wrap(&mut self, text: &str, x: f32, top: f32, max_width: f32) -> f32 {
        let mut used = 0.0;
        for paragraph in text.split('\n') {
            for span in self
                .fonts
                .line_breaker()
                .wrap(paragraph, self.metrics, max_width.max(1.0))
            {
                let line = paragraph[span.byte_range].trim_end();
                if !line.is_empty() {
                    self.place(line.to_string(), x, top + used);
                }
                used += self.metrics.line_height;
            }
        }
        used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Document};
    use crate::layout::{FixedMeasurer, HeaderFooter, Page, PageGeometry, PageGeometryConfig};
    use crate::render::fragment::build_fragments;

    fn fragment_of(blocks: Vec<Block>, watermark: &str) -> PageFragment {
        let geometry = PageGeometry::for_export(&PageGeometryConfig::default()).unwrap();
        let mut page = Page::new(0);
        page.blocks = blocks;
        build_fragments(&[page], &geometry, Some(&HeaderFooter::default()), watermark).remove(0)
    }

    fn body(lines: &[TextLine]) -> Vec<&str> {
        lines
            .iter()
            .filter(|l| l.style == TextStyle::Body)
            .map(|l| l.text.as_str())
            .collect()
    }

    #[test]
    fn test_block_text_follows_measured_heights() {
        let fragment = fragment_of(
            vec![Block::heading(1, "Agreement"), Block::paragraph("The parties agree.")],
            "",
        );
        let measurer = FixedMeasurer::new(100.0);
        let lines = layout_text(&fragment, &measurer, &MetricsMeasurer::new());

        assert_eq!(body(&lines), vec!["Agreement", "The parties agree."]);
        let (top, _, left, _) = fragment.geometry.layout_margins();
        let heading = &lines[0];
        let paragraph = &lines[1];
        assert_eq!(heading.font_size, 32.0);
        assert_eq!(heading.x, left);
        // Second block starts 100px down: half its spacing, half-leading, ascent
        assert!((paragraph.y - (top + 100.0 + 8.0 + 3.2 + 12.8)).abs() < 0.01);
    }

    #[test]
    fn test_long_paragraph_wraps() {
        let text = "terms and conditions ".repeat(40);
        let fragment = fragment_of(vec![Block::paragraph(text.trim())], "");
        let lines = layout_text(&fragment, &MetricsMeasurer::new(), &MetricsMeasurer::new());
        let body = body(&lines);
        assert!(body.len() > 3);
        assert_eq!(body.join(" "), text.trim());
    }

    #[test]
    fn test_lists_and_tables() {
        let doc = Document::from_html(
            "<ol><li>first</li><li>second</li></ol><table><tr><td>Name</td><td>Role</td></tr></table>",
        );
        let fragment = fragment_of(doc.blocks().to_vec(), "");
        let lines = layout_text(&fragment, &MetricsMeasurer::new(), &MetricsMeasurer::new());
        assert_eq!(body(&lines), vec!["1.", "first", "2.", "second", "Name", "Role"]);

        let name = lines.iter().find(|l| l.text == "Name").unwrap();
        let role = lines.iter().find(|l| l.text == "Role").unwrap();
        assert_eq!(name.y, role.y);
        assert!(role.x > name.x);
    }

    #[test]
    fn test_chrome_and_watermark() {
        let fragment = fragment_of(vec![Block::paragraph("x")], "DRAFT");
        let lines = layout_text(&fragment, &FixedMeasurer::new(20.0), &MetricsMeasurer::new());

        assert_eq!(lines[0].style, TextStyle::Watermark);
        assert_eq!(lines[0].text, "DRAFT");
        let chrome: Vec<_> = lines
            .iter()
            .filter(|l| l.style == TextStyle::Chrome)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(chrome, vec!["Document Header", "Page 1"]);
    }
}

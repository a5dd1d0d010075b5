//! Thumbnail pagination for the page navigation panel
//!
//! An independent, approximate pass at thumbnail scale. It follows the same
//! break rules as the live paginator but measures each block at the narrow
//! thumbnail width, so its page count may differ from the real layout.

use serde::Serialize;

use crate::document::Block;
use crate::layout::{measure_or_min, paginate_with, Measurer};

pub const PREVIEW_WIDTH: f32 = 150.0;
pub const PREVIEW_HEIGHT: f32 = PREVIEW_WIDTH / 210.0 * 297.0;
pub const PREVIEW_PADDING: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailPage {
    pub index: usize,
    pub html: String,
    pub block_count: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewRenderer {
    width: f32,
    height: f32,
    padding: f32,
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self {
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            padding: PREVIEW_PADDING,
        }
    }
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width blocks are measured at
    pub fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.padding).max(1.0)
    }

    pub fn render(&self, blocks: &[Block], measurer: &dyn Measurer) -> Vec<ThumbnailPage> {
        let width = self.content_width();
        paginate_with(blocks, self.height, |block| {
            measure_or_min(measurer, block, width)
        })
        .into_iter()
        .map(|page| ThumbnailPage {
            index: page.index,
            html: page.blocks.iter().map(|b| b.html.as_str()).collect(),
            block_count: page.blocks.len(),
            label: format!("Page {}", page.number()),
        })
        .collect()
    }
}

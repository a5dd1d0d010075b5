//! Pagination: distributing blocks onto fixed-height pages

use log::debug;

use crate::document::Block;
use crate::layout::geometry::PageGeometry;
use crate::layout::measure::{measure_or_min, Measurer};

/// A page of the paginated document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,
    /// Content blocks; explicit break markers are never included
    pub blocks: Vec<Block>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
}

impl Page {
    /// Create a new empty page
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 1-based page number shown to the user
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Header and footer templates applied to every page
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderFooter {
    pub header: String,
    /// Footer text; the running page number is appended
    pub footer: String,
}

impl Default for HeaderFooter {
    fn default() -> Self {
        Self {
            header: "Document Header".to_string(),
            footer: "Page".to_string(),
        }
    }
}

impl HeaderFooter {
    pub fn footer_for(&self, page_number: usize) -> String {
        if self.footer.is_empty() {
            page_number.to_string()
        } else {
            format!("{} {}", self.footer, page_number)
        }
    }
}

/// Paginate blocks using the measurer at the geometry's layout width
pub fn paginate(blocks: &[Block], geometry: &PageGeometry, measurer: &dyn Measurer) -> Vec<Page> {
    let width = geometry.layout_width();
    paginate_with(blocks, geometry.layout_height(), |block| {
        measure_or_min(measurer, block, width)
    })
}

/// Core page-breaking loop.
///
/// An explicit break closes the current page even when it is empty. A block
/// that does not fit closes the current page unless the page is empty, so a
/// block taller than a page sits alone on its own page. Blocks are never
/// split. The last page is always closed, so the result is never empty.
pub fn paginate_with(
    blocks: &[Block],
    usable_height: f32,
    mut height_of: impl FnMut(&Block) -> f32,
) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::new(0);
    let mut accumulated: f32 = 0.0;

    for block in blocks {
        if block.is_page_break() {
            debug!("explicit break closes page {}", current.index);
            let next = Page::new(current.index + 1);
            pages.push(std::mem::replace(&mut current, next));
            accumulated = 0.0;
            continue;
        }

        let height = height_of(block);
        if accumulated + height > usable_height && !current.is_empty() {
            debug!(
                "page {} full at {accumulated:.1}px of {usable_height:.1}px",
                current.index
            );
            let next = Page::new(current.index + 1);
            pages.push(std::mem::replace(&mut current, next));
            accumulated = 0.0;
        }

        current.blocks.push(block.clone());
        accumulated += height;
    }

    pages.push(current);
    pages
}

/// Fill header and footer text of every page
pub fn apply_header_footer(pages: &mut [Page], header_footer: Option<&HeaderFooter>) {
    for page in pages {
        match header_footer {
            Some(hf) => {
                page.header_text = Some(hf.header.clone());
                page.footer_text = Some(hf.footer_for(page.number()));
            }
            None => {
                page.header_text = None;
                page.footer_text = None;
            }
        }
    }
}

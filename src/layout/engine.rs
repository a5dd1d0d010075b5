//! Live-view layout state with cached measurements

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::document::{Block, Document};
use crate::layout::geometry::PageGeometry;
use crate::layout::measure::{try_measure, Measurer, MIN_BLOCK_HEIGHT};
use crate::layout::pagination::{apply_header_footer, paginate_with, HeaderFooter, Page};

/// Changes produced by a relayout
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDiff {
    pub page_count: usize,
    pub previous_page_count: usize,
    /// Indices of pages whose content differs from the previous layout
    pub changed_pages: Vec<usize>,
}

impl PaginationDiff {
    pub fn has_changes(&self) -> bool {
        self.page_count != self.previous_page_count || !self.changed_pages.is_empty()
    }
}

/// Complete layout state of the live view
pub struct LayoutState {
    geometry: PageGeometry,
    header_footer: Option<HeaderFooter>,
    /// Measured heights keyed by (content hash, width bits)
    heights: FxHashMap<(u64, u32), f32>,
    pages: Vec<Page>,
    /// Version of document this layout corresponds to
    layout_version: u64,
}

impl LayoutState {
    /// Create new layout state
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            header_footer: None,
            heights: FxHashMap::default(),
            pages: vec![Page::new(0)],
            layout_version: 0,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Switch geometry; cached heights survive only if the layout width is unchanged
    pub fn set_geometry(&mut self, geometry: PageGeometry) {
        if geometry.layout_width() != self.geometry.layout_width() {
            self.invalidate_all();
        }
        self.geometry = geometry;
    }

    pub fn set_header_footer(&mut self, header_footer: Option<HeaderFooter>) {
        self.header_footer = header_footer;
        apply_header_footer(&mut self.pages, self.header_footer.as_ref());
    }

    /// Drop every cached measurement
    pub fn invalidate_all(&mut self) {
        self.heights.clear();
    }

    /// Repaginate the document, measuring only blocks not seen before.
    /// Failed measurements fall back to the minimal height and are retried next time.
    pub fn relayout(&mut self, document: &Document, measurer: &dyn Measurer) -> PaginationDiff {
        let width = self.geometry.layout_width();
        let width_bits = width.to_bits();
        let heights = &mut self.heights;
        let mut seen = FxHashSet::default();

        let mut measure = |block: &Block| {
            let key = (block.content_hash(), width_bits);
            seen.insert(key);
            if let Some(&height) = heights.get(&key) {
                return height;
            }
            match try_measure(measurer, block, width) {
                Ok(height) => {
                    heights.insert(key, height);
                    height
                }
                Err(err) => {
                    debug!("measurement of {:?} block failed: {err}; using minimal height", block.kind);
                    MIN_BLOCK_HEIGHT
                }
            }
        };
        let mut pages = paginate_with(document.blocks(), self.geometry.layout_height(), &mut measure);
        apply_header_footer(&mut pages, self.header_footer.as_ref());

        // Forget blocks that left the document
        self.heights.retain(|key, _| seen.contains(key));

        let diff = PaginationDiff {
            page_count: pages.len(),
            previous_page_count: self.pages.len(),
            changed_pages: (0..pages.len())
                .filter(|&i| self.pages.get(i) != pages.get(i))
                .collect(),
        };
        debug!(
            "relayout v{}: {} pages, {} changed",
            document.version(),
            diff.page_count,
            diff.changed_pages.len()
        );

        self.pages = pages;
        self.layout_version = document.version();
        diff
    }

    /// Get page count
    pub fn page_count(&self) -> usize {
        self.pages.len().max(1)
    }

    /// Get pages
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    /// Number of cached block heights
    pub fn cached_heights(&self) -> usize {
        self.heights.len()
    }
}

//! Layout: page geometry, measurement and pagination

mod engine;
pub mod font;
pub mod geometry;
mod line_break;
pub mod measure;
mod pagination;

pub use engine::{LayoutState, PaginationDiff};
pub use font::FontMetrics;
pub use geometry::{
    mm_to_px, px_to_pt, GeometryError, Margins, PageGeometry, PageGeometryConfig, PaperSize,
};
pub use line_break::{LineBreaker, LineSpan};
pub use measure::{
    measure_or_min, try_measure, FixedMeasurer, MeasureError, Measurer, MetricsMeasurer,
    MIN_BLOCK_HEIGHT,
};
pub use pagination::{apply_header_footer, paginate, paginate_with, HeaderFooter, Page};

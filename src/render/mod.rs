//! Render output: page fragments and rasterization

mod fragment;
mod raster;
mod text;

pub use fragment::{build_fragments, export_stylesheet, PageFragment};
pub use raster::{decode_png, DraftRasterizer, RasterError, RasterSpec, Rasterizer, EXPORT_SCALE};
pub use text::{layout_text, TextLine, TextStyle};

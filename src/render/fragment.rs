//! Page fragments: self-contained renderable pages for export

use quick_xml::escape::partial_escape;

use crate::document::Block;
use crate::layout::{HeaderFooter, Page, PageGeometry};

/// One page ready for rasterization
#[derive(Debug, Clone, PartialEq)]
pub struct PageFragment {
    pub page_index: usize,
    pub page_count: usize,
    pub blocks: Vec<Block>,
    pub header: Option<String>,
    /// Footer text; rendered followed by the page number
    pub footer: Option<String>,
    pub watermark: Option<String>,
    pub geometry: PageGeometry,
}

impl PageFragment {
    /// 1-based page number
    pub fn page_number(&self) -> usize {
        self.page_index + 1
    }

    /// Standalone markup of the page, styled by [`export_stylesheet`]
    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="pdf-page">"#);
        if let Some(header) = &self.header {
            html.push_str(&format!(
                r#"<div class="pdf-header">{}</div>"#,
                partial_escape(header)
            ));
        }
        for block in &self.blocks {
            html.push_str(&block.html);
        }
        if let Some(footer) = &self.footer {
            html.push_str(&format!(
                r#"<div class="pdf-footer">{} <span class="pdf-page-number">{}</span></div>"#,
                partial_escape(footer),
                self.page_number()
            ));
        }
        if let Some(watermark) = &self.watermark {
            html.push_str(&format!(
                r#"<div class="pdf-watermark">{}</div>"#,
                partial_escape(watermark)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Build one fragment per page
pub fn build_fragments(
    pages: &[Page],
    geometry: &PageGeometry,
    header_footer: Option<&HeaderFooter>,
    watermark: &str,
) -> Vec<PageFragment> {
    let watermark = watermark.trim();
    pages
        .iter()
        .map(|page| PageFragment {
            page_index: page.index,
            page_count: pages.len(),
            blocks: page.blocks.clone(),
            header: header_footer.map(|hf| hf.header.clone()),
            footer: header_footer.map(|hf| hf.footer.clone()),
            watermark: (!watermark.is_empty()).then(|| watermark.to_string()),
            geometry: *geometry,
        })
        .collect()
}

/// Styles of the export page, sized for the geometry
pub fn export_stylesheet(geometry: &PageGeometry) -> String {
    let (width, height) = geometry.layout_page_size();
    let (top, bottom, left, right) = geometry.layout_margins();
    format!(
        r#".page-break {{ page-break-after: always; break-after: page; height: 0; overflow: hidden; }}
.pdf-page {{ width: {width:.2}px; min-height: {height:.2}px; padding: {top:.2}px {right:.2}px {bottom:.2}px {left:.2}px; box-sizing: border-box; position: relative; background-color: white; color: black; font-family: sans-serif; font-size: 12pt; line-height: 1.4; }}
.pdf-header, .pdf-footer {{ position: absolute; left: {left:.2}px; right: {right:.2}px; font-size: 10pt; color: #333; text-align: center; }}
.pdf-header {{ top: {header_top:.2}px; }}
.pdf-footer {{ bottom: {footer_bottom:.2}px; }}
.pdf-page-number {{ float: right; }}
.pdf-watermark {{ position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%) rotate(-45deg); font-size: 4em; color: rgba(0, 0, 0, 0.1); pointer-events: none; user-select: none; z-index: 10; white-space: nowrap; }}
.comment-highlight {{ background-color: transparent !important; }}
table {{ border-collapse: collapse; width: 100%; margin: 1em 0; }}
th, td {{ border: 1px solid #ccc; padding: 0.5em; text-align: left; }}
th {{ background-color: #f0f0f0; }}
"#,
        header_top = top / 2.0,
        footer_bottom = bottom / 2.0,
    )
}

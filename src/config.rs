//! User-facing editor settings

use serde::{Deserialize, Serialize};

use crate::layout::{HeaderFooter, Margins, PageGeometryConfig, PaperSize};

/// Zoom factors offered by the toolbar
pub const ZOOM_PRESETS: [f32; 4] = [0.5, 0.75, 1.0, 1.25];

/// Toolbar label for a zoom factor, e.g. `125%`
pub fn zoom_label(zoom: f32) -> String {
    format!("{}%", (zoom * 100.0).round() as i32)
}

/// Settings the host passes in as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub paper: PaperSize,
    pub margins: Margins,
    pub watermark_text: String,
    pub show_header_footer: bool,
    pub zoom: f32,
    pub header_text: String,
    pub footer_text: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let header_footer = HeaderFooter::default();
        Self {
            paper: PaperSize::A4,
            margins: Margins::default(),
            watermark_text: String::new(),
            show_header_footer: false,
            zoom: 1.0,
            header_text: header_footer.header,
            footer_text: header_footer.footer,
        }
    }
}

impl EditorSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn geometry_config(&self) -> PageGeometryConfig {
        PageGeometryConfig {
            paper: self.paper,
            margins: self.margins,
            zoom: self.zoom,
            show_header_footer: self.show_header_footer,
        }
    }

    /// Header and footer templates, when enabled
    pub fn header_footer(&self) -> Option<HeaderFooter> {
        self.show_header_footer.then(|| HeaderFooter {
            header: self.header_text.clone(),
            footer: self.footer_text.clone(),
        })
    }
}

//! Page geometry: physical page configuration in millimetres to pixel space

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Device resolution of the layout space
pub const PIXELS_PER_INCH: f32 = 96.0;
pub const MM_PER_INCH: f32 = 25.4;
/// PDF user-space units per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Convert millimetres to CSS pixels at 96 DPI
pub fn mm_to_px(mm: f32) -> f32 {
    mm / MM_PER_INCH * PIXELS_PER_INCH
}

/// Convert CSS pixels to PDF points
pub fn px_to_pt(px: f32) -> f32 {
    px / PIXELS_PER_INCH * POINTS_PER_INCH
}

/// Physical paper format
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Width and height in millimetres
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match *self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// Page margins in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 25.0,
            bottom: 25.0,
            left: 20.0,
            right: 20.0,
        }
    }
}

impl Margins {
    pub fn uniform(mm: f32) -> Self {
        Self {
            top: mm,
            bottom: mm,
            left: mm,
            right: mm,
        }
    }

    fn sides(&self) -> [(&'static str, f32); 4] {
        [
            ("top", self.top),
            ("bottom", self.bottom),
            ("left", self.left),
            ("right", self.right),
        ]
    }
}

/// Rejected page configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{side} margin must be a finite, non-negative length (got {value} mm)")]
    InvalidMargin { side: &'static str, value: f32 },
    #[error("zoom must be a finite positive factor (got {0})")]
    InvalidZoom(f32),
    #[error("paper size must be finite and positive (got {width_mm} x {height_mm} mm)")]
    InvalidPaper { width_mm: f32, height_mm: f32 },
    #[error("vertical margins ({margins} mm) leave no usable height on a {page} mm page")]
    NoUsableHeight { page: f32, margins: f32 },
    #[error("horizontal margins ({margins} mm) leave no usable width on a {page} mm page")]
    NoUsableWidth { page: f32, margins: f32 },
}

/// Physical page configuration, as chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageGeometryConfig {
    pub paper: PaperSize,
    pub margins: Margins,
    pub zoom: f32,
    pub show_header_footer: bool,
}

impl Default for PageGeometryConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            margins: Margins::default(),
            zoom: 1.0,
            show_header_footer: false,
        }
    }
}

impl PageGeometryConfig {
    /// Check the configuration without building a geometry
    pub fn validate(&self) -> Result<(), GeometryError> {
        let (width_mm, height_mm) = self.paper.dimensions_mm();
        let paper_ok = |v: f32| v.is_finite() && v > 0.0;
        if !paper_ok(width_mm) || !paper_ok(height_mm) {
            return Err(GeometryError::InvalidPaper {
                width_mm,
                height_mm,
            });
        }
        for (side, value) in self.margins.sides() {
            if !value.is_finite() || value < 0.0 {
                return Err(GeometryError::InvalidMargin { side, value });
            }
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(GeometryError::InvalidZoom(self.zoom));
        }

        let vertical = self.margins.top + self.margins.bottom;
        if vertical >= height_mm {
            return Err(GeometryError::NoUsableHeight {
                page: height_mm,
                margins: vertical,
            });
        }
        let horizontal = self.margins.left + self.margins.right;
        if horizontal >= width_mm {
            return Err(GeometryError::NoUsableWidth {
                page: width_mm,
                margins: horizontal,
            });
        }
        Ok(())
    }
}

/// Validated page geometry in CSS pixels.
///
/// Display dimensions are scaled by the zoom factor. Pagination uses the
/// unzoomed layout box, so page breaks never depend on the zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    config: PageGeometryConfig,
    page_width: f32,
    page_height: f32,
    margin_top: f32,
    margin_bottom: f32,
    margin_left: f32,
    margin_right: f32,
}

impl PageGeometry {
    /// Validate a configuration and convert it to pixel space
    pub fn new(config: &PageGeometryConfig) -> Result<Self, GeometryError> {
        config.validate()?;
        let (width_mm, height_mm) = config.paper.dimensions_mm();
        Ok(Self {
            config: *config,
            page_width: mm_to_px(width_mm),
            page_height: mm_to_px(height_mm),
            margin_top: mm_to_px(config.margins.top),
            margin_bottom: mm_to_px(config.margins.bottom),
            margin_left: mm_to_px(config.margins.left),
            margin_right: mm_to_px(config.margins.right),
        })
    }

    /// Geometry used for export: always at zoom 1.0
    pub fn for_export(config: &PageGeometryConfig) -> Result<Self, GeometryError> {
        Self::new(&PageGeometryConfig {
            zoom: 1.0,
            ..*config
        })
    }

    pub fn config(&self) -> &PageGeometryConfig {
        &self.config
    }

    pub fn zoom(&self) -> f32 {
        self.config.zoom
    }

    pub fn show_header_footer(&self) -> bool {
        self.config.show_header_footer
    }

    pub fn page_width(&self) -> f32 {
        self.page_width * self.zoom()
    }

    pub fn page_height(&self) -> f32 {
        self.page_height * self.zoom()
    }

    pub fn margin_top(&self) -> f32 {
        self.margin_top * self.zoom()
    }

    pub fn margin_bottom(&self) -> f32 {
        self.margin_bottom * self.zoom()
    }

    pub fn margin_left(&self) -> f32 {
        self.margin_left * self.zoom()
    }

    pub fn margin_right(&self) -> f32 {
        self.margin_right * self.zoom()
    }

    /// Usable content width at the current zoom
    pub fn usable_width(&self) -> f32 {
        self.layout_width() * self.zoom()
    }

    /// Usable content height at the current zoom
    pub fn usable_height(&self) -> f32 {
        self.layout_height() * self.zoom()
    }

    /// Usable content width at zoom 1.0, used for measurement
    pub fn layout_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Usable content height at zoom 1.0, used for page breaking
    pub fn layout_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// Unzoomed page size in CSS pixels
    pub fn layout_page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    /// Unzoomed margins in CSS pixels: top, bottom, left, right
    pub fn layout_margins(&self) -> (f32, f32, f32, f32) {
        (
            self.margin_top,
            self.margin_bottom,
            self.margin_left,
            self.margin_right,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_mm_to_px() {
        assert!(approx(mm_to_px(25.4), 96.0));
        assert!(approx(mm_to_px(210.0), 793.7));
        assert!(approx(px_to_pt(96.0), 72.0));
    }

    #[test]
    fn test_default_geometry() {
        let geometry = PageGeometry::new(&PageGeometryConfig::default()).unwrap();
        assert!(approx(geometry.page_width(), 793.7));
        assert!(approx(geometry.page_height(), 1122.52));
        assert!(approx(geometry.usable_height(), mm_to_px(247.0)));
        assert!(approx(geometry.usable_width(), mm_to_px(170.0)));
    }

    #[test]
    fn test_letter_with_inch_margins() {
        let config = PageGeometryConfig {
            paper: PaperSize::Letter,
            margins: Margins::uniform(25.4),
            ..Default::default()
        };
        let geometry = PageGeometry::new(&config).unwrap();
        assert!(approx(geometry.page_width(), 816.0));
        assert!(approx(geometry.usable_width(), 624.0));
        assert!(approx(geometry.usable_height(), 864.0));
    }

    #[test]
    fn test_zoom_scales_display_but_not_layout() {
        let config = PageGeometryConfig {
            zoom: 1.25,
            ..Default::default()
        };
        let zoomed = PageGeometry::new(&config).unwrap();
        let export = PageGeometry::for_export(&config).unwrap();

        assert!(approx(zoomed.usable_height(), export.usable_height() * 1.25));
        assert_eq!(zoomed.layout_height(), export.layout_height());
        assert_eq!(zoomed.layout_width(), export.layout_width());
        assert_eq!(export.zoom(), 1.0);
    }

    #[test]
    fn test_margins_leaving_no_height_rejected() {
        let config = PageGeometryConfig {
            margins: Margins {
                top: 150.0,
                bottom: 150.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            PageGeometry::new(&config),
            Err(GeometryError::NoUsableHeight { .. })
        ));
    }

    #[test]
    fn test_margins_leaving_no_width_rejected() {
        let config = PageGeometryConfig {
            margins: Margins {
                left: 105.0,
                right: 105.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            PageGeometry::new(&config),
            Err(GeometryError::NoUsableWidth { .. })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let negative = PageGeometryConfig {
            margins: Margins {
                left: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            negative.validate(),
            Err(GeometryError::InvalidMargin {
                side: "left",
                value: -1.0
            })
        );

        let nan = PageGeometryConfig {
            margins: Margins {
                top: f32::NAN,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(GeometryError::InvalidMargin { side: "top", .. })
        ));

        let zero_zoom = PageGeometryConfig {
            zoom: 0.0,
            ..Default::default()
        };
        assert_eq!(zero_zoom.validate(), Err(GeometryError::InvalidZoom(0.0)));

        let custom = PageGeometryConfig {
            paper: PaperSize::Custom {
                width_mm: 0.0,
                height_mm: 100.0,
            },
            ..Default::default()
        };
        assert!(matches!(
            custom.validate(),
            Err(GeometryError::InvalidPaper { .. })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: PageGeometryConfig = serde_json::from_str(
            r#"{"paper":"letter","margins":{"top":10,"bottom":10},"showHeaderFooter":true}"#,
        )
        .unwrap();
        assert_eq!(config.paper, PaperSize::Letter);
        assert_eq!(config.margins.top, 10.0);
        assert_eq!(config.margins.left, 20.0);
        assert!(config.show_header_footer);
        assert_eq!(config.zoom, 1.0);
    }
}

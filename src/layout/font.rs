//! Font metrics for measurement

/// Body font size in CSS pixels (12pt)
pub const BODY_FONT_SIZE: f32 = 16.0;

/// Line height factor of body text
pub const LINE_HEIGHT_FACTOR: f32 = 1.4;

/// Metrics needed for text measurement
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Font size in CSS pixels
    pub font_size: f32,
    /// Line height in CSS pixels
    pub line_height: f32,
    /// Advance widths of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::sans_serif(BODY_FONT_SIZE)
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            font_size: line_height / LINE_HEIGHT_FACTOR,
            line_height,
            char_widths,
            default_width,
        }
    }

    /// Approximate proportional metrics of a Helvetica/Arial-like face
    pub fn sans_serif(font_size: f32) -> Self {
        let char_widths = (0u8..128)
            .map(|b| font_size * sans_serif_advance(b as char))
            .collect();
        Self {
            font_size,
            line_height: font_size * LINE_HEIGHT_FACTOR,
            char_widths,
            default_width: font_size * 0.6,
        }
    }

    /// Fixed-width metrics where every character advances the same
    pub fn monospace(font_size: f32) -> Self {
        let advance = font_size * 0.6;
        Self {
            font_size,
            line_height: font_size * LINE_HEIGHT_FACTOR,
            char_widths: vec![advance; 128],
            default_width: advance,
        }
    }

    /// Same face at a different size
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            font_size: self.font_size * factor,
            line_height: self.line_height * factor,
            char_widths: self.char_widths.iter().map(|w| w * factor).collect(),
            default_width: self.default_width * factor,
        }
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_control() {
            return 0.0;
        }
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Width of a string
    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.width(c)).sum()
    }
}

/// Advance of an ASCII character in ems
fn sans_serif_advance(c: char) -> f32 {
    match c {
        c if c.is_control() => 0.0,
        ' ' | '!' | '\'' | ',' | '.' | ':' | ';' | '|' | 'i' | 'j' | 'l' | 'I' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '/' => 0.33,
        'm' | 'M' | 'W' => 0.83,
        'w' | '@' | '%' => 0.72,
        'A'..='Z' => 0.67,
        '0'..='9' => 0.56,
        _ => 0.5,
    }
}

//! Line breaking algorithm

use std::ops::Range;

use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

use crate::layout::font::FontMetrics;

/// A laid-out line of text
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    /// Byte range within the text, including trailing whitespace
    pub byte_range: Range<usize>,
    /// Width of the visible content
    pub width: f32,
}

/// Greedy line breaker over Unicode break opportunities
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Break text into lines no wider than `max_width`. A segment wider than
    /// the line on its own is broken between grapheme clusters.
    pub fn wrap(&self, text: &str, metrics: &FontMetrics, max_width: f32) -> Vec<LineSpan> {
        if text.is_empty() {
            // Empty text still occupies one line
            return vec![LineSpan {
                byte_range: 0..0,
                width: 0.0,
            }];
        }

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width: f32 = 0.0;
        let mut segment_start = 0;

        for (idx, opportunity) in linebreaks(text) {
            let segment = &text[segment_start..idx];
            let visible = segment.trim_end();
            let visible_width = cluster_width(visible, metrics);

            if line_width + visible_width > max_width && line_start < segment_start {
                lines.push(LineSpan {
                    byte_range: line_start..segment_start,
                    width: line_width,
                });
                line_start = segment_start;
                line_width = 0.0;
            }

            if visible_width > max_width {
                // Emergency break inside an unbreakable segment
                for (offset, grapheme) in segment.grapheme_indices(true) {
                    let w = cluster_width(grapheme, metrics);
                    let at = segment_start + offset;
                    if line_width + w > max_width && line_start < at && !is_blank(grapheme) {
                        lines.push(LineSpan {
                            byte_range: line_start..at,
                            width: line_width,
                        });
                        line_start = at;
                        line_width = 0.0;
                    }
                    line_width += w;
                }
            } else {
                line_width += cluster_width(segment, metrics);
            }
            segment_start = idx;

            if opportunity == BreakOpportunity::Mandatory && idx < text.len() {
                lines.push(LineSpan {
                    byte_range: line_start..idx,
                    width: line_width,
                });
                line_start = idx;
                line_width = 0.0;
            }
        }

        lines.push(LineSpan {
            byte_range: line_start..text.len(),
            width: line_width,
        });
        lines
    }

    /// Number of lines the text occupies
    pub fn line_count(&self, text: &str, metrics: &FontMetrics, max_width: f32) -> usize {
        self.wrap(text, metrics, max_width).len()
    }
}

fn is_blank(grapheme: &str) -> bool {
    grapheme.chars().all(char::is_whitespace)
}

fn cluster_width(text: &str, metrics: &FontMetrics) -> f32 {
    text.chars()
        .map(|c| match c {
            '\t' => metrics.default_width * 4.0,
            c => metrics.width(c),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_metrics() -> FontMetrics {
        // 8px per char, 10px lines
        FontMetrics::new(10.0, vec![8.0; 128], 8.0)
    }

    #[test]
    fn test_empty_text() {
        let lines = LineBreaker::new().wrap("", &fixed_metrics(), 100.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].byte_range, 0..0);
    }

    #[test]
    fn test_single_line() {
        let lines = LineBreaker::new().wrap("Hello", &fixed_metrics(), 100.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].byte_range, 0..5);
        assert_eq!(lines[0].width, 40.0);
    }

    #[test]
    fn test_line_wrap() {
        // With 8px per char, 48px width = 6 chars per line
        let lines = LineBreaker::new().wrap("Hello World", &fixed_metrics(), 48.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..6);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_trailing_space_does_not_overflow() {
        // "Hello " is 48px, but the space hangs
        let lines = LineBreaker::new().wrap("Hello World", &fixed_metrics(), 40.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_explicit_newline() {
        let lines = LineBreaker::new().wrap("Hello\nWorld", &fixed_metrics(), 1000.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..6);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_emergency_break() {
        // 10 chars of 8px into 32px lines: 4 + 4 + 2
        let lines = LineBreaker::new().wrap("abcdefghij", &fixed_metrics(), 32.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].byte_range, 0..4);
        assert_eq!(lines[2].byte_range, 8..10);
    }

    #[test]
    fn test_line_count_grows_as_width_shrinks() {
        let text = "the quick brown fox jumps over the lazy dog";
        let breaker = LineBreaker::new();
        let metrics = fixed_metrics();
        assert!(breaker.line_count(text, &metrics, 80.0) > breaker.line_count(text, &metrics, 200.0));
    }
}

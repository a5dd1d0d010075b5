//! Block-level elements of a document snapshot

use std::hash::{Hash, Hasher};

use quick_xml::escape::partial_escape;
use rustc_hash::FxHasher;

use super::inline::Run;

/// The kind of block element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BlockKind {
    /// Regular paragraph
    #[default]
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    List { ordered: bool },
    Table,
    Image,
    Blockquote,
    CodeBlock,
    /// Horizontal rule
    Rule,
    /// Explicit page-break marker; never rendered as content
    PageBreak,
    /// Any other top-level element, by tag name
    Other(String),
}

impl BlockKind {
    /// Font size relative to body text
    pub fn font_scale(&self) -> f32 {
        match self {
            BlockKind::Heading { level } => match level {
                1 => 2.0,
                2 => 1.5,
                3 => 1.17,
                4 => 1.0,
                5 => 0.83,
                _ => 0.67,
            },
            BlockKind::CodeBlock => 0.875,
            _ => 1.0,
        }
    }

    /// Vertical spacing around this block (in ems of its own font)
    pub fn spacing(&self) -> f32 {
        match self {
            BlockKind::Paragraph | BlockKind::List { .. } | BlockKind::Blockquote => 1.0,
            BlockKind::Heading { level } if *level <= 2 => 0.83,
            BlockKind::Heading { .. } => 1.0,
            BlockKind::Table | BlockKind::CodeBlock => 1.0,
            BlockKind::Rule => 0.5,
            BlockKind::Image | BlockKind::PageBreak | BlockKind::Other(_) => 0.0,
        }
    }

    /// Horizontal indentation of the block's text in CSS pixels
    pub fn indent(&self) -> f32 {
        match self {
            BlockKind::List { .. } | BlockKind::Blockquote => 40.0,
            BlockKind::CodeBlock => 16.0,
            _ => 0.0,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    pub fn is_page_break(&self) -> bool {
        matches!(self, BlockKind::PageBreak)
    }
}

/// Structural content that measurement needs beyond plain runs
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BlockBody {
    /// Flowing inline text (the block's runs)
    #[default]
    Inline,
    /// List items, as plain text
    Items(Vec<String>),
    /// Table rows of cell texts
    Rows(Vec<Vec<String>>),
    /// Image with its declared dimensions in CSS pixels
    Image {
        width: Option<f32>,
        height: Option<f32>,
    },
    /// No content
    Empty,
}

/// A top-level block of the document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub kind: BlockKind,
    /// Serialized markup of the block, exactly as it appeared in the snapshot
    pub html: String,
    pub runs: Vec<Run>,
    pub body: BlockBody,
}

impl Block {
    /// Create a plain paragraph
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            html: format!("<p>{}</p>", partial_escape(text)),
            runs: vec![Run::plain(text)],
            body: BlockBody::Inline,
        }
    }

    /// Create a heading, clamping the level to 1-6
    pub fn heading(level: u8, text: &str) -> Self {
        let level = level.clamp(1, 6);
        Self {
            kind: BlockKind::Heading { level },
            html: format!("<h{level}>{}</h{level}>", partial_escape(text)),
            runs: vec![Run::plain(text)],
            body: BlockBody::Inline,
        }
    }

    /// Create an explicit page-break marker
    pub fn page_break() -> Self {
        Self {
            kind: BlockKind::PageBreak,
            html: r#"<div data-type="page-break" class="page-break"></div>"#.to_string(),
            runs: Vec::new(),
            body: BlockBody::Empty,
        }
    }

    pub fn is_page_break(&self) -> bool {
        self.kind.is_page_break()
    }

    /// Plain text of the block: list items and table rows on separate lines
    pub fn text(&self) -> String {
        match &self.body {
            BlockBody::Items(items) => items.join("\n"),
            BlockBody::Rows(rows) => rows
                .iter()
                .map(|cells| cells.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
            BlockBody::Image { .. } | BlockBody::Empty => String::new(),
            BlockBody::Inline => self.runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }

    /// Hash of the block's markup, used to key cached measurements
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.html.hash(&mut hasher);
        hasher.finish()
    }
}

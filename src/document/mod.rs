//! Document model: read-only snapshots of the editing engine's content

mod block;
pub mod html;
mod inline;

pub use block::{Block, BlockBody, BlockKind};
pub use inline::{Mark, MarkKind, Run};

use rustc_hash::FxHashSet;
use unicode_segmentation::UnicodeSegmentation;

/// A parsed snapshot of the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Top-level blocks in document order
    blocks: Vec<Block>,
    /// The snapshot the blocks were parsed from
    source: String,
    /// Monotonic version counter
    version: u64,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an HTML snapshot
    pub fn from_html(html: &str) -> Self {
        Self {
            blocks: html::parse_blocks(html),
            source: html.to_string(),
            version: 0,
        }
    }

    /// Build a document directly from blocks
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let source = blocks.iter().map(|b| b.html.as_str()).collect();
        Self {
            blocks,
            source,
            version: 0,
        }
    }

    /// Replace the content with a newer snapshot, bumping the version
    pub fn replace(&mut self, html: &str) {
        self.blocks = html::parse_blocks(html);
        self.source = html.to_string();
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The snapshot markup, verbatim
    pub fn html(&self) -> &str {
        &self.source
    }

    /// True when the document holds no content blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is_page_break())
    }

    /// Number of explicit page-break markers
    pub fn page_break_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_page_break()).count()
    }

    /// Plain text with one line per block
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| !b.is_page_break())
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of user-perceived characters in the text content
    pub fn char_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.text().graphemes(true).filter(|g| *g != "\n").count())
            .sum()
    }

    /// Ids of every comment anchored somewhere in the document
    pub fn comment_ids(&self) -> FxHashSet<String> {
        self.blocks
            .iter()
            .flat_map(|b| b.runs.iter())
            .filter_map(|r| r.comment_id().map(str::to_string))
            .collect()
    }
}

//! Editing command interface: the only way the core changes the document

mod ledger;

pub use ledger::MarkLedger;

use thiserror::Error;

use crate::document::Mark;

/// A range of document positions, as understood by the editing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.from < other.to && other.from < self.to
    }
}

/// Block-level formatting toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockToggle {
    Paragraph,
    Heading(u8),
    BulletList,
    OrderedList,
    Blockquote,
    CodeBlock,
}

impl BlockToggle {
    /// Name used by the editing engine
    pub fn name(&self) -> &'static str {
        match self {
            BlockToggle::Paragraph => "paragraph",
            BlockToggle::Heading(_) => "heading",
            BlockToggle::BulletList => "bulletList",
            BlockToggle::OrderedList => "orderedList",
            BlockToggle::Blockquote => "blockquote",
            BlockToggle::CodeBlock => "codeBlock",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("range {from}..{to} is outside the document")]
    OutOfRange { from: usize, to: usize },
    #[error("command `{command}` was rejected: {reason}")]
    Rejected {
        command: &'static str,
        reason: String,
    },
}

/// Capabilities the core needs from the external editing engine
pub trait EditorCommands {
    fn apply_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError>;

    /// Remove `mark` from `range`; removing an absent mark is not an error
    fn remove_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError>;

    /// Remove `mark` wherever it appears in the document
    fn clear_mark(&mut self, mark: &Mark) -> Result<(), CommandError>;

    fn toggle_block(&mut self, toggle: BlockToggle) -> Result<(), CommandError>;

    /// Insert an explicit page-break marker at the selection
    fn insert_page_break(&mut self) -> Result<(), CommandError>;
}

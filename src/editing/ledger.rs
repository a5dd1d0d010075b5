//! In-memory editing engine that records applied commands

use crate::document::{Mark, MarkKind};
use crate::editing::{BlockToggle, CommandError, EditorCommands, TextRange};

/// Records marks, block toggles and page breaks applied through
/// [`EditorCommands`]. Used natively and in tests in place of the host engine.
#[derive(Debug, Clone, Default)]
pub struct MarkLedger {
    /// Length of the document in engine positions
    doc_len: usize,
    marks: Vec<(Mark, TextRange)>,
    toggles: Vec<BlockToggle>,
    page_breaks: usize,
}

impl MarkLedger {
    pub fn new(doc_len: usize) -> Self {
        Self {
            doc_len,
            ..Default::default()
        }
    }

    pub fn set_doc_len(&mut self, doc_len: usize) {
        self.doc_len = doc_len;
    }

    /// Applied marks in application order
    pub fn marks(&self) -> &[(Mark, TextRange)] {
        &self.marks
    }

    pub fn marks_of(&self, kind: MarkKind) -> impl Iterator<Item = &(Mark, TextRange)> {
        self.marks.iter().filter(move |(m, _)| m.kind() == kind)
    }

    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.iter().any(|(m, _)| m == mark)
    }

    pub fn toggles(&self) -> &[BlockToggle] {
        &self.toggles
    }

    pub fn page_breaks(&self) -> usize {
        self.page_breaks
    }

    fn check_range(&self, range: TextRange) -> Result<(), CommandError> {
        if range.to > self.doc_len || range.from > range.to {
            return Err(CommandError::OutOfRange {
                from: range.from,
                to: range.to,
            });
        }
        Ok(())
    }
}

impl EditorCommands for MarkLedger {
    fn apply_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError> {
        self.check_range(range)?;
        if range.is_empty() {
            return Err(CommandError::Rejected {
                command: "setMark",
                reason: "empty selection".into(),
            });
        }
        self.marks.push((mark.clone(), range));
        Ok(())
    }

    fn remove_mark(&mut self, mark: &Mark, range: TextRange) -> Result<(), CommandError> {
        self.check_range(range)?;
        self.marks.retain(|(m, r)| !(m == mark && r.overlaps(&range)));
        Ok(())
    }

    fn clear_mark(&mut self, mark: &Mark) -> Result<(), CommandError> {
        self.marks.retain(|(m, _)| m != mark);
        Ok(())
    }

    fn toggle_block(&mut self, toggle: BlockToggle) -> Result<(), CommandError> {
        if let BlockToggle::Heading(level) = toggle {
            if !(1..=6).contains(&level) {
                return Err(CommandError::Rejected {
                    command: "toggleHeading",
                    reason: format!("invalid heading level {level}"),
                });
            }
        }
        self.toggles.push(toggle);
        Ok(())
    }

    fn insert_page_break(&mut self) -> Result<(), CommandError> {
        self.page_breaks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_remove_mark() {
        let mut ledger = MarkLedger::new(100);
        let comment = Mark::Comment {
            id: "comment-1".into(),
        };
        ledger.apply_mark(&Mark::Bold, TextRange::new(0, 5)).unwrap();
        ledger.apply_mark(&comment, TextRange::new(10, 20)).unwrap();
        assert_eq!(ledger.marks().len(), 2);
        assert_eq!(ledger.marks_of(MarkKind::Comment).count(), 1);

        ledger.remove_mark(&comment, TextRange::new(10, 20)).unwrap();
        assert!(!ledger.has_mark(&comment));
        assert!(ledger.has_mark(&Mark::Bold));

        // Absent mark
        ledger.remove_mark(&comment, TextRange::new(10, 20)).unwrap();
    }

    #[test]
    fn test_range_checks() {
        let mut ledger = MarkLedger::new(10);
        assert_eq!(
            ledger.apply_mark(&Mark::Italic, TextRange::new(5, 11)),
            Err(CommandError::OutOfRange { from: 5, to: 11 })
        );
        assert!(matches!(
            ledger.apply_mark(&Mark::Italic, TextRange::new(5, 5)),
            Err(CommandError::Rejected { .. })
        ));
        assert!(ledger.marks().is_empty());
    }

    #[test]
    fn test_block_commands() {
        let mut ledger = MarkLedger::new(0);
        ledger.toggle_block(BlockToggle::Heading(2)).unwrap();
        assert!(ledger.toggle_block(BlockToggle::Heading(7)).is_err());
        ledger.insert_page_break().unwrap();
        ledger.insert_page_break().unwrap();
        assert_eq!(ledger.toggles(), &[BlockToggle::Heading(2)]);
        assert_eq!(ledger.page_breaks(), 2);
    }
}

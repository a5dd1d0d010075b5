//! Comment store: the single authority over comment bodies

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::document::{Document, Mark};
use crate::editing::{CommandError, EditorCommands, TextRange};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommentError {
    #[error("select some text to add a comment")]
    EmptySelection,
    #[error("comment text is empty")]
    EmptyText,
    #[error("no comment with id `{0}`")]
    NotFound(String),
    #[error("editing engine refused the comment mark: {0}")]
    Engine(#[from] CommandError),
}

/// A comment anchored on a range of text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub anchor: TextRange,
}

impl Comment {
    /// The mark anchoring this comment in the document
    pub fn mark(&self) -> Mark {
        Mark::Comment {
            id: self.id.clone(),
        }
    }
}

/// Comments in insertion order, keyed by id
#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    comments: Vec<Comment>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor a new comment on `selection`. The mark is applied first; the
    /// entry is stored only if the engine accepted it.
    pub fn add(
        &mut self,
        engine: &mut dyn EditorCommands,
        selection: TextRange,
        text: &str,
        author: &str,
        now: DateTime<Utc>,
    ) -> Result<&Comment, CommentError> {
        if selection.is_empty() {
            return Err(CommentError::EmptySelection);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentError::EmptyText);
        }

        let comment = Comment {
            id: self.next_id(now),
            text: text.to_string(),
            author: author.to_string(),
            timestamp: now,
            anchor: selection,
        };
        engine.apply_mark(&comment.mark(), selection)?;
        info!("added comment {} on {}..{}", comment.id, selection.from, selection.to);

        self.comments.push(comment);
        let last = self.comments.len() - 1;
        Ok(&self.comments[last])
    }

    /// Remove a comment and its mark. If the engine refuses to clear the
    /// mark, the entry is kept.
    pub fn remove(
        &mut self,
        engine: &mut dyn EditorCommands,
        id: &str,
    ) -> Result<Comment, CommentError> {
        let position = self
            .comments
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CommentError::NotFound(id.to_string()))?;

        let comment = &self.comments[position];
        engine.remove_mark(&comment.mark(), comment.anchor)?;
        info!("removed comment {id}");
        Ok(self.comments.remove(position))
    }

    /// Drop entries whose mark no longer appears in the document, e.g.
    /// after the user deleted the commented text
    pub fn reconcile(&mut self, document: &Document) -> Vec<Comment> {
        let anchored = document.comment_ids();
        let (kept, orphaned): (Vec<_>, Vec<_>) = std::mem::take(&mut self.comments)
            .into_iter()
            .partition(|c| anchored.contains(&c.id));
        self.comments = kept;
        for comment in &orphaned {
            debug!("comment {} lost its anchor", comment.id);
        }
        orphaned
    }

    /// Comment ids marked in the document that have no entry, sorted
    pub fn unanchored_marks(&self, document: &Document) -> Vec<String> {
        let mut ids: Vec<String> = document
            .comment_ids()
            .into_iter()
            .filter(|id| self.get(id).is_none())
            .collect();
        ids.sort();
        ids
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// `comment-<unix millis>`, suffixed when the id is already taken
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let base = format!("comment-{}", now.timestamp_millis());
        if self.get(&base).is_none() {
            return base;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.get(&candidate).is_none() {
                return candidate;
            }
            suffix += 1;
        }
    }
}

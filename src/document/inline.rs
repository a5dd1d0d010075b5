//! Inline content: text runs and the marks applied to them

use smallvec::SmallVec;

/// Discriminant of a [`Mark`], used where attributes do not matter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    Link,
    Comment,
}

impl MarkKind {
    /// Name used by the editing engine for this mark
    pub fn name(&self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Underline => "underline",
            MarkKind::Strike => "strike",
            MarkKind::Superscript => "superscript",
            MarkKind::Subscript => "subscript",
            MarkKind::Link => "link",
            MarkKind::Comment => "comment",
        }
    }
}

/// An inline formatting mark with its attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Superscript,
    Subscript,
    Link { href: String },
    /// Anchor of a comment; carries only the id; the comment body lives in the store
    Comment { id: String },
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Underline => MarkKind::Underline,
            Mark::Strike => MarkKind::Strike,
            Mark::Superscript => MarkKind::Superscript,
            Mark::Subscript => MarkKind::Subscript,
            Mark::Link { .. } => MarkKind::Link,
            Mark::Comment { .. } => MarkKind::Comment,
        }
    }

    /// Attributes as name/value pairs, in the form the editing engine expects
    pub fn attrs(&self) -> Vec<(&'static str, &str)> {
        match self {
            Mark::Link { href } => vec![("href", href.as_str())],
            Mark::Comment { id } => vec![("commentId", id.as_str())],
            _ => Vec::new(),
        }
    }

    /// Recognize a mark from an inline element
    pub(crate) fn from_element(tag: &str, attr: impl Fn(&str) -> Option<String>) -> Option<Mark> {
        if let Some(id) = attr("data-comment-id") {
            return Some(Mark::Comment { id });
        }
        match tag {
            "strong" | "b" => Some(Mark::Bold),
            "em" | "i" => Some(Mark::Italic),
            "u" => Some(Mark::Underline),
            "s" | "strike" | "del" => Some(Mark::Strike),
            "sup" => Some(Mark::Superscript),
            "sub" => Some(Mark::Subscript),
            "a" => Some(Mark::Link {
                href: attr("href").unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// A run of text sharing the same marks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub marks: SmallVec<[Mark; 2]>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: SmallVec::new(),
        }
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks.iter().any(|m| m.kind() == kind)
    }

    /// Comment id anchored on this run, if any
    pub fn comment_id(&self) -> Option<&str> {
        self.marks.iter().find_map(|m| match m {
            Mark::Comment { id } => Some(id.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_mark_from_element() {
        let none = |_: &str| None;
        assert_eq!(Mark::from_element("strong", none), Some(Mark::Bold));
        assert_eq!(Mark::from_element("i", none), Some(Mark::Italic));
        assert_eq!(Mark::from_element("span", none), None);

        let comment = |name: &str| (name == "data-comment-id").then(|| "comment-1".to_string());
        assert_eq!(
            Mark::from_element("span", comment),
            Some(Mark::Comment {
                id: "comment-1".into()
            })
        );
    }

    #[test]
    fn test_run_comment_id() {
        let run = Run {
            text: "clause".into(),
            marks: smallvec![
                Mark::Bold,
                Mark::Comment {
                    id: "comment-42".into()
                }
            ],
        };
        assert!(run.has_mark(MarkKind::Bold));
        assert!(!run.has_mark(MarkKind::Italic));
        assert_eq!(run.comment_id(), Some("comment-42"));
        assert_eq!(Run::plain("x").comment_id(), None);
    }

    #[test]
    fn test_mark_attrs() {
        let link = Mark::Link {
            href: "https://example.com".into(),
        };
        assert_eq!(link.kind().name(), "link");
        assert_eq!(link.attrs(), vec![("href", "https://example.com")]);
        assert!(Mark::Bold.attrs().is_empty());
    }
}

//! Tolerant parsing of HTML snapshots into blocks

use quick_xml::escape::partial_escape;
use scraper::{ElementRef, Html, Node};
use smallvec::SmallVec;

use super::block::{Block, BlockBody, BlockKind};
use super::inline::{Mark, Run};

/// Inline elements that may appear loose at the top level
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "em", "i", "mark", "s", "small", "span", "strike", "strong",
    "sub", "sup", "u", "del", "ins",
];

/// Top-level inline content waiting to be wrapped in a paragraph
enum Loose<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

/// Parse a snapshot into top-level blocks. Never fails: malformed markup is
/// repaired by the HTML5 parser and loose text becomes an implicit paragraph.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let mut blocks = Vec::new();
    let mut loose = Vec::new();

    for child in root.children() {
        if let Node::Text(text) = child.value() {
            if !text.text.trim().is_empty() || !loose.is_empty() {
                loose.push(Loose::Text(&*text.text));
            }
            continue;
        }
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };
        if INLINE_TAGS.contains(&element.value().name()) {
            loose.push(Loose::Element(element));
        } else {
            flush_loose(&mut loose, &mut blocks);
            blocks.push(block_from_element(element));
        }
    }
    flush_loose(&mut loose, &mut blocks);

    blocks
}

/// Wrap accumulated loose inline nodes into one implicit paragraph
fn flush_loose(loose: &mut Vec<Loose<'_>>, blocks: &mut Vec<Block>) {
    let mut inner = String::new();
    let mut runs = Vec::new();
    let mut marks = SmallVec::new();

    for item in loose.drain(..) {
        match item {
            Loose::Text(text) => {
                inner.push_str(&partial_escape(text));
                push_text(&mut runs, text, &marks, false);
            }
            Loose::Element(element) => {
                inner.push_str(&element.html());
                collect_element(element, &mut marks, &mut runs, false);
            }
        }
    }

    if inner.trim().is_empty() {
        return;
    }
    trim_runs(&mut runs);
    blocks.push(Block {
        kind: BlockKind::Paragraph,
        html: format!("<p>{}</p>", inner.trim()),
        runs,
        body: BlockBody::Inline,
    });
}

fn block_from_element(element: ElementRef<'_>) -> Block {
    let el = element.value();
    let name = el.name();

    let is_marker =
        el.attr("data-type") == Some("page-break") || el.classes().any(|c| c == "page-break");
    if is_marker {
        return Block {
            kind: BlockKind::PageBreak,
            html: element.html(),
            runs: Vec::new(),
            body: BlockBody::Empty,
        };
    }

    let kind = match name {
        "p" => BlockKind::Paragraph,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => BlockKind::Heading {
            level: name[1..].parse().unwrap_or(1),
        },
        "ul" => BlockKind::List { ordered: false },
        "ol" => BlockKind::List { ordered: true },
        "table" => BlockKind::Table,
        "img" | "figure" => BlockKind::Image,
        "blockquote" => BlockKind::Blockquote,
        "pre" => BlockKind::CodeBlock,
        "hr" => BlockKind::Rule,
        other => BlockKind::Other(other.to_string()),
    };

    let body = match &kind {
        BlockKind::List { .. } => BlockBody::Items(list_items(element)),
        BlockKind::Table => BlockBody::Rows(table_rows(element)),
        BlockKind::Image => image_body(element),
        BlockKind::Rule => BlockBody::Empty,
        _ => BlockBody::Inline,
    };

    let mut runs = Vec::new();
    if matches!(body, BlockBody::Inline) {
        let preformatted = kind == BlockKind::CodeBlock;
        collect_children(element, &mut SmallVec::new(), &mut runs, preformatted);
        if !preformatted {
            trim_runs(&mut runs);
        }
    }

    Block {
        kind,
        html: element.html(),
        runs,
        body,
    }
}

/// Walk an inline element, tracking the marks in effect
fn collect_element(
    element: ElementRef<'_>,
    marks: &mut SmallVec<[Mark; 2]>,
    runs: &mut Vec<Run>,
    preformatted: bool,
) {
    let el = element.value();
    if el.name() == "br" {
        push_text(runs, "\n", marks, true);
        return;
    }
    let mark = Mark::from_element(el.name(), |attr| el.attr(attr).map(str::to_string));
    let pushed = mark.is_some();
    if let Some(mark) = mark {
        marks.push(mark);
    }
    collect_children(element, marks, runs, preformatted);
    if pushed {
        marks.pop();
    }
}

fn collect_children(
    element: ElementRef<'_>,
    marks: &mut SmallVec<[Mark; 2]>,
    runs: &mut Vec<Run>,
    preformatted: bool,
) {
    for child in element.children() {
        if let Node::Text(text) = child.value() {
            push_text(runs, &text.text, marks, preformatted);
        } else if let Some(inner) = ElementRef::wrap(child) {
            collect_element(inner, marks, runs, preformatted);
        }
    }
}

/// Append text, merging with the previous run when the marks match
fn push_text(runs: &mut Vec<Run>, text: &str, marks: &[Mark], preformatted: bool) {
    let text = if preformatted {
        text.to_string()
    } else {
        collapse_whitespace(text)
    };
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.marks.as_slice() == marks => last.text.push_str(&text),
        _ => runs.push(Run {
            text,
            marks: marks.iter().cloned().collect(),
        }),
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Strip leading and trailing whitespace of the block's text
fn trim_runs(runs: &mut Vec<Run>) {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    runs.retain(|r| !r.text.is_empty());
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
        .trim()
        .to_string()
}

fn list_items(list: ElementRef<'_>) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(element_text)
        .collect()
}

fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect()
        })
        .collect()
}

fn image_body(element: ElementRef<'_>) -> BlockBody {
    let img = if element.value().name() == "img" {
        Some(element)
    } else {
        element
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "img")
    };
    let dimension = |name: &str| {
        img.and_then(|img| img.value().attr(name))
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
    };
    BlockBody::Image {
        width: dimension("width"),
        height: dimension("height"),
    }
}

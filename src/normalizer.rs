//! Canonical HTML serialization used for fingerprinting and snapshot storage.
//!
//! The same logical document always serializes to byte-identical text: source
//! whitespace is collapsed, attributes are sorted by name, and comments are
//! dropped, so only structural or textual changes move the fingerprint.

use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt;

/// Tags whose text keeps its internal line structure.
const LINE_PRESERVING_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const INDENT: &str = "  ";

/// Canonical text plus its content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPage {
    /// Stable textual serialization of the fetched markup.
    pub text: String,
    /// SHA-256 hex digest of `text`, used for change detection.
    pub fingerprint: String,
}

/// Errors surfaced while canonicalizing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// The response body held no content to serialize.
    EmptyBody,
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "no body content available for normalization"),
        }
    }
}

impl Error for NormalizationError {}

/// Parses `body` as HTML and re-serializes it into the canonical form.
pub fn canonicalize(body: &str) -> Result<CanonicalPage, NormalizationError> {
    if body.trim().is_empty() {
        return Err(NormalizationError::EmptyBody);
    }

    let document = Html::parse_document(body);
    let mut text = String::with_capacity(body.len());
    for child in document.tree.root().children() {
        emit_node(child, 0, &mut text);
    }

    let fingerprint = fingerprint(&text);
    Ok(CanonicalPage { text, fingerprint })
}

/// SHA-256 hex digest of canonical text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn emit_node(node: NodeRef<'_, Node>, depth: usize, out: &mut String) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                emit_node(child, depth, out);
            }
        }
        Node::Doctype(doctype) => {
            push_line(out, depth, &format!("<!DOCTYPE {}>", doctype.name()));
        }
        Node::Text(text) => {
            if parent_preserves_lines(&node) {
                for line in text.lines() {
                    let trimmed = line.trim_end();
                    if !trimmed.is_empty() {
                        push_line(out, depth, trimmed);
                    }
                }
            } else {
                let collapsed = collapse_whitespace(text);
                if !collapsed.is_empty() {
                    push_line(out, depth, &collapsed);
                }
            }
        }
        Node::Element(element) => {
            push_line(out, depth, &open_tag(element));
            for child in node.children() {
                emit_node(child, depth + 1, out);
            }
            if !VOID_TAGS.contains(&element.name()) {
                push_line(out, depth, &format!("</{}>", element.name()));
            }
        }
        // Comments and processing instructions carry no tracked content.
        _ => {}
    }
}

fn open_tag(element: &Element) -> String {
    let mut attrs: Vec<(&str, &str)> = element.attrs().collect();
    attrs.sort_unstable();

    let mut tag = String::new();
    tag.push('<');
    tag.push_str(element.name());
    for (name, value) in attrs {
        tag.push(' ');
        tag.push_str(name);
        tag.push_str("=\"");
        tag.push_str(&value.replace('"', "&quot;"));
        tag.push('"');
    }
    tag.push('>');
    tag
}

fn parent_preserves_lines(node: &NodeRef<'_, Node>) -> bool {
    node.parent()
        .and_then(|parent| match parent.value() {
            Node::Element(element) => Some(LINE_PRESERVING_TAGS.contains(&element.name())),
            _ => None,
        })
        .unwrap_or(false)
}

fn push_line(out: &mut String, depth: usize, line: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(line);
    out.push('\n');
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim().to_string()
}

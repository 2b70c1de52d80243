//! HTML fragment to plain text
//!
//! Parsing goes through html5ever (via `scraper`), which never fails on
//! malformed markup. Only text nodes are kept. Block-level elements become
//! line breaks so that paragraph structure survives into the document.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

/// Elements whose boundaries start a new line
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "tr", "ul",
];

/// Elements whose text is never content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// Strip all markup from an HTML fragment, keeping text nodes only
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let mut out = String::new();
    collect_text(*parsed.root_element(), &mut out);
    out.trim().to_string()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    break_line(out);
                }
                collect_text(child, out);
                if block {
                    break_line(out);
                }
            }
            _ => {}
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

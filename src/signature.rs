use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node};

use crate::constants::SIGNATURE_ATTRIBUTE_KEYWORD;
use crate::quotation::attr_mentions;

/// Elements marked as signatures by their class or id (`gmail_signature` and
/// friends). Signatures inside quoted history belong to the quoted message,
/// not this one, so anything under a structural quote is skipped.
pub fn signature_removal_set(
    document: &Html,
    structural_quote_ids: &HashSet<NodeId>,
) -> Vec<NodeId> {
    document
        .root_element()
        .descendants()
        .filter(|node| {
            let el = match node.value() {
                Node::Element(el) => el,
                _ => return false,
            };
            (attr_mentions(el, "class", SIGNATURE_ATTRIBUTE_KEYWORD)
                || attr_mentions(el, "id", SIGNATURE_ATTRIBUTE_KEYWORD))
                && !under_any(*node, structural_quote_ids)
        })
        .map(|node| node.id())
        .collect()
}

fn under_any(node: NodeRef<'_, Node>, ids: &HashSet<NodeId>) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if ids.contains(&current.id()) {
            return true;
        }
        cursor = current.parent();
    }
    false
}

/// Renders the signature for the caller before it is removed: the outer HTML
/// (with pointless single-div nesting flattened) and a plain-text version with
/// line breaks between the signature's lines.
pub fn render_signature(document: &Html, id: NodeId) -> Option<(String, String)> {
    let node = document.tree.get(id)?;
    let element = ElementRef::wrap(flatten_wrappers(node))?;

    let html = element.html();

    let mut plain = String::new();
    let mut first = true;
    for child in element.children() {
        if let Node::Element(el) = child.value()
            && el.name() == "div"
            && !first
        {
            plain.push('\n');
        }
        if let Some(child_el) = ElementRef::wrap(child) {
            for text in child_el.text() {
                plain.push_str(text);
            }
        } else if let Node::Text(text) = child.value() {
            plain.push_str(text);
        }
        if !matches!(child.value(), Node::Text(t) if t.trim().is_empty()) {
            first = false;
        }
    }
    let plain = trim_invisible(&plain).to_string();

    Some((html, plain))
}

/// Signatures often arrive as a div holding nothing but another div, several
/// levels deep. Descends to the innermost meaningful element.
fn flatten_wrappers(node: NodeRef<'_, Node>) -> NodeRef<'_, Node> {
    let mut current = node;
    loop {
        match current.value() {
            Node::Element(el) if el.name() == "div" => {}
            _ => return current,
        }
        let mut only_child = None;
        for child in current.children() {
            match child.value() {
                Node::Text(text) if text.trim().is_empty() => continue,
                Node::Element(inner) if inner.name() == "div" => {
                    if only_child.is_some() {
                        return current;
                    }
                    only_child = Some(child);
                }
                _ => return current,
            }
        }
        match only_child {
            Some(child) => current = child,
            None => return current,
        }
    }
}

/// Trims whitespace plus the zero-width characters mail clients pad
/// signatures with.
fn trim_invisible(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}')
    })
}

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

use crate::constants::{QUOTE_ATTRIBUTE_KEYWORD, is_empty_like};

/// Elements that look like quoted reply history: `<blockquote>`, or anything
/// whose class or id mentions "quote" (`gmail_quote`, `yahoo_quoted`, ...).
/// Document order, so ancestors come before their nested candidates.
pub fn find_quote_candidates(document: &Html) -> Vec<NodeId> {
    document
        .root_element()
        .descendants()
        .filter(|node| match node.value() {
            Node::Element(el) => {
                el.name() == "blockquote"
                    || attr_mentions(el, "class", QUOTE_ATTRIBUTE_KEYWORD)
                    || attr_mentions(el, "id", QUOTE_ATTRIBUTE_KEYWORD)
            }
            _ => false,
        })
        .map(|node| node.id())
        .collect()
}

pub fn attr_mentions(el: &scraper::node::Element, attr: &str, keyword: &str) -> bool {
    el.attr(attr)
        .is_some_and(|value| value.to_ascii_lowercase().contains(keyword))
}

/// Filters candidates down to the ones safe to remove: a quote is removable
/// only when nothing but whitespace and other quotes follows it in the
/// document. A quote with real content after it was quoted inline, on
/// purpose, and stays.
pub fn structural_candidates(document: &Html, candidates: &[NodeId]) -> Vec<NodeId> {
    let candidate_set: HashSet<NodeId> = candidates.iter().copied().collect();
    // Subtrees already proven contentless; shared across candidates so the
    // trailing run of quotes is only walked once.
    let mut contentless: HashSet<NodeId> = HashSet::new();

    candidates
        .iter()
        .copied()
        .filter(|&candidate| {
            let node = match document.tree.get(candidate) {
                Some(node) => node,
                None => return false,
            };
            !content_follows(node, &candidate_set, &mut contentless)
        })
        .collect()
}

/// Walks everything after `node` in document order and reports whether any of
/// it is content (an image, or non-empty text) outside a quote candidate.
fn content_follows(
    node: NodeRef<'_, Node>,
    candidate_set: &HashSet<NodeId>,
    contentless: &mut HashSet<NodeId>,
) -> bool {
    let mut cursor = node;
    loop {
        while let Some(next) = cursor.next_sibling() {
            if subtree_has_content(next, candidate_set, contentless) {
                return true;
            }
            cursor = next;
        }
        match cursor.parent() {
            Some(parent) => cursor = parent,
            None => return false,
        }
    }
}

fn subtree_has_content(
    root: NodeRef<'_, Node>,
    candidate_set: &HashSet<NodeId>,
    contentless: &mut HashSet<NodeId>,
) -> bool {
    if contentless.contains(&root.id()) {
        return false;
    }

    let mut visited: Vec<NodeId> = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if contentless.contains(&node.id()) {
            continue;
        }
        visited.push(node.id());
        let is_content = match node.value() {
            Node::Element(el) => el.name() == "img",
            Node::Text(text) => !is_empty_like(text),
            _ => false,
        };
        if is_content && !inside_candidate(node, candidate_set) {
            // Content found; nothing walked so far can be cached because the
            // walk was cut short.
            return true;
        }
        stack.extend(node.children());
    }

    contentless.extend(visited);
    false
}

/// True when the node or any ancestor is itself a quote candidate. Content
/// inside a later quote does not protect an earlier one.
fn inside_candidate(node: NodeRef<'_, Node>, candidate_set: &HashSet<NodeId>) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if candidate_set.contains(&current.id()) {
            return true;
        }
        cursor = current.parent();
    }
    false
}

use ego_tree::{NodeId, Tree};
use scraper::{Html, Node};

use crate::constants::{BODY_SELECTOR, TEXTUAL_TAGS, is_empty_like};

/// Removes trailing emptiness (whitespace-only text, stray `<br>`/`<hr>`,
/// elements emptied out by the other passes) from the end of the document.
/// Works backwards from the last node and cascades: when a trailing child
/// vanishes, its parent's new last child is inspected too. Stops at the first
/// real content.
pub fn collapse_trailing_whitespace(document: &mut Html) {
    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| body.id())
        .unwrap_or_else(|| document.root_element().id());
    collapse_children(&mut document.tree, root);
}

/// Trims trailing children of `id` without ever deleting `id` itself.
fn collapse_children(tree: &mut Tree<Node>, id: NodeId) {
    loop {
        let last = match tree.get(id).and_then(|node| node.last_child()) {
            Some(child) => child.id(),
            None => return,
        };
        if !collapse_node(tree, last) {
            return;
        }
    }
}

/// Collapses one trailing node. Returns true when the node was removed, which
/// tells the caller to re-inspect the preceding sibling.
fn collapse_node(tree: &mut Tree<Node>, id: NodeId) -> bool {
    enum Kind {
        Comment,
        EmptyText,
        Text,
        Boundary,
        Textual,
        Opaque,
    }

    let kind = {
        let node = match tree.get(id) {
            Some(node) => node,
            None => return false,
        };
        match node.value() {
            Node::Comment(_) => Kind::Comment,
            Node::Text(text) => {
                if is_empty_like(text) {
                    Kind::EmptyText
                } else {
                    Kind::Text
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if name == "body" || name == "html" {
                    Kind::Boundary
                } else if TEXTUAL_TAGS.contains(&name) {
                    Kind::Textual
                } else {
                    Kind::Opaque
                }
            }
            _ => Kind::Opaque,
        }
    };

    match kind {
        Kind::Comment | Kind::EmptyText => {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
            true
        }
        Kind::Text => {
            // Real text ends the collapse; only its own trailing whitespace goes.
            if let Some(mut node) = tree.get_mut(id)
                && let Node::Text(text) = node.value()
            {
                let trimmed = text.trim_end().to_string();
                if trimmed.len() != text.len() {
                    text.text = trimmed.as_str().into();
                }
            }
            false
        }
        Kind::Boundary => {
            collapse_children(tree, id);
            false
        }
        Kind::Opaque => false,
        Kind::Textual => loop {
            let last = tree.get(id).and_then(|node| node.last_child()).map(|c| c.id());
            match last {
                None => {
                    if let Some(mut node) = tree.get_mut(id) {
                        node.detach();
                    }
                    return true;
                }
                Some(child) => {
                    if !collapse_node(tree, child) {
                        return false;
                    }
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapse(html: &str) -> String {
        let mut document = Html::parse_document(html);
        collapse_trailing_whitespace(&mut document);
        document
            .select(&BODY_SELECTOR)
            .next()
            .map(|body| body.inner_html())
            .unwrap_or_default()
    }

    #[test]
    fn removes_trailing_breaks_and_rules() {
        assert_eq!(collapse("<div>Hello<br> <hr> <br></div>"), "<div>Hello</div>");
    }

    #[test]
    fn cascades_through_emptied_wrappers() {
        assert_eq!(
            collapse("<p>Hi</p><div><span><br></span> </div>"),
            "<p>Hi</p>"
        );
    }

    #[test]
    fn stops_at_images() {
        let result = collapse("<div>Hi<img src=\"cid:x\"><br></div>");
        assert_eq!(result, "<div>Hi<img src=\"cid:x\"></div>");
    }

    #[test]
    fn right_trims_final_text() {
        assert_eq!(collapse("<div>Hello   </div>"), "<div>Hello</div>");
    }

    #[test]
    fn removes_trailing_comments() {
        assert_eq!(collapse("<div>Hi</div><!-- tail -->"), "<div>Hi</div>");
    }

    #[test]
    fn never_deletes_the_body() {
        assert_eq!(collapse("<br> "), "");
    }

    #[test]
    fn dash_remnants_are_empty_like() {
        assert_eq!(collapse("<div>Hi</div><div>--</div>"), "<div>Hi</div>");
    }
}

use ego_tree::NodeId;
use scraper::{Html, Node};

use crate::constants::{
    BODY_SELECTOR, PLAINTEXT_SPLITTER_RE, QUOTE_HEADER_END_RE, QUOTE_HEADER_START_RE,
};
use crate::walker::BackwardWalker;

/// Finds the dangling reply header ("On Jan 3, 2020, Alice wrote:") that some
/// clients leave as loose text at the very end of the message once the quoted
/// block itself has been removed.
///
/// Scans backwards from the end of the body. The last real text must end like
/// a reply header; from there, nodes are collected until the line that starts
/// like one ("On ...", "Le ...", ...), which bounds the header. Headers often
/// span several text nodes with `<br>`s or phone numbers in between, so
/// everything inside the bounds is collected. Returns an empty vec when the
/// message does not end with a header.
pub fn find_quote_header_nodes(document: &Html) -> Vec<NodeId> {
    let body = match document.select(&BODY_SELECTOR).next() {
        Some(body) => body,
        None => return Vec::new(),
    };

    let mut marked: Vec<NodeId> = Vec::new();
    let mut in_header = false;

    for node in BackwardWalker::new(*body) {
        match node.value() {
            Node::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                if !in_header {
                    if !QUOTE_HEADER_END_RE.is_match(text) {
                        // The message ends with real content, not a header.
                        return Vec::new();
                    }
                    marked.push(node.id());
                    if QUOTE_HEADER_START_RE.is_match(text) {
                        // Single-node header.
                        return marked;
                    }
                    in_header = true;
                } else {
                    marked.push(node.id());
                    if QUOTE_HEADER_START_RE.is_match(text) {
                        return marked;
                    }
                }
            }
            Node::Element(el) => {
                if !in_header {
                    continue;
                }
                let name = el.name();
                if name == "body" || name == "html" {
                    break;
                }
                marked.push(node.id());
            }
            _ => {}
        }
    }

    // Ran out of body without finding the start of the header; removing the
    // collected nodes would eat arbitrary content.
    Vec::new()
}

/// Plaintext counterpart of quotation cleaning: returns everything before the
/// first reply separator (a reply header line, an "original message" rule, or
/// a forwarded `From:` header), trimmed.
pub fn extract_reply_plaintext(text: &str) -> String {
    match PLAINTEXT_SPLITTER_RE.find(text) {
        Some(m) => text[..m.start()].trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed_text(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        find_quote_header_nodes(&document)
            .into_iter()
            .filter_map(|id| {
                let node = document.tree.get(id)?;
                match node.value() {
                    Node::Text(t) => Some(t.trim().to_string()),
                    Node::Element(el) => Some(format!("<{}>", el.name())),
                    _ => None,
                }
            })
            .collect()
    }

    #[test]
    fn finds_single_node_header() {
        let removed = removed_text("<div>Hi there</div><div>On Jan 3, 2020, Alice wrote:</div>");
        assert_eq!(removed, ["On Jan 3, 2020, Alice wrote:"]);
    }

    #[test]
    fn finds_header_split_across_breaks() {
        let removed = removed_text(
            "<div>Hi there</div><div>On Jan 3, 2020,<br>Alice &lt;a@example.com&gt;<br>wrote:</div>",
        );
        assert_eq!(removed, ["wrote:", "<br>", "Alice <a@example.com>", "<br>", "On Jan 3, 2020,"]);
    }

    #[test]
    fn french_header_is_found() {
        let removed = removed_text("<p>Salut</p><p>Le 3 janvier 2020, X a écrit :</p>");
        assert_eq!(removed, ["Le 3 janvier 2020, X a écrit :"]);
    }

    #[test]
    fn verb_medial_headers_are_found() {
        // German and Scandinavian clients put the sender after the verb.
        let removed = removed_text("<p>Hallo</p><p>Am 3. Januar 2020 schrieb Alice:</p>");
        assert_eq!(removed, ["Am 3. Januar 2020 schrieb Alice:"]);

        let removed = removed_text("<p>Hej</p><p>Den 3. januar 2020 skrev Bob</p>");
        assert_eq!(removed, ["Den 3. januar 2020 skrev Bob"]);
    }

    #[test]
    fn plaintext_reply_is_split_on_verb_medial_header() {
        let text = "Klingt gut!\n\nAm 3. Januar 2020 schrieb Alice:\n> Passt Montag?";
        assert_eq!(extract_reply_plaintext(text), "Klingt gut!");
    }

    #[test]
    fn plain_content_at_end_is_untouched() {
        assert!(removed_text("<div>On my desk</div><div>See you tomorrow</div>").is_empty());
    }

    #[test]
    fn unbounded_header_is_not_removed() {
        // Ends like a header but no line ever starts like one.
        assert!(removed_text("<div>Here is what she wrote:</div>").is_empty());
    }

    #[test]
    fn trailing_whitespace_does_not_hide_the_header() {
        let removed =
            removed_text("<div>Hi</div><div>On Jan 3, 2020, Alice wrote:</div>\n\n  ");
        assert_eq!(removed, ["On Jan 3, 2020, Alice wrote:"]);
    }

    #[test]
    fn plaintext_reply_is_split_on_header() {
        let text = "Sounds good, see you then!\n\nOn Jan 3, 2020, Alice wrote:\n> Want to meet?";
        assert_eq!(extract_reply_plaintext(text), "Sounds good, see you then!");
    }

    #[test]
    fn plaintext_reply_is_split_on_original_message_rule() {
        let text = "Thanks!\n-----Original Message-----\nFrom: Bob";
        assert_eq!(extract_reply_plaintext(text), "Thanks!");
    }

    #[test]
    fn plaintext_reply_is_split_on_from_header() {
        let text = "ok\n\nFrom: Alice <alice@example.com>\nSent: Monday";
        assert_eq!(extract_reply_plaintext(text), "ok");
    }

    #[test]
    fn plaintext_without_history_is_trimmed_only() {
        assert_eq!(extract_reply_plaintext("  just a note \n"), "just a note");
    }
}

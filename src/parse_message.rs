use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{Html, Node};
use tracing::{debug, warn};

use crate::autolink::autolink;
use crate::constants::{BODY_SELECTOR, is_empty_like};
use crate::error::Result;
use crate::options::ParseMessageOptions;
use crate::quotation::{find_quote_candidates, structural_candidates};
use crate::quote_string::find_quote_header_nodes;
use crate::repair::repair_structure;
use crate::rewrite::rewrite_document;
use crate::signature::{render_signature, signature_removal_set};
use crate::whitespace::collapse_trailing_whitespace;

/// Output of [`parse_message`]. The `did_find_*` fields are `None` when the
/// corresponding pass was not requested, `Some(false)` when it ran but
/// removed nothing.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Cleaned document with quotes and signatures still in place.
    pub complete_html: String,
    /// Cleaned document with quotes and signatures removed.
    pub parsed_message_html: String,
    pub did_find_quotation: Option<bool>,
    pub did_find_signature: Option<bool>,
    pub found_signature_plain_text: Option<String>,
    pub found_signature_html: Option<String>,
}

/// Normalizes an HTML email body. Always repairs malformed structure, strips
/// comments, scripts, tracking pixels and meta redirects, and collapses
/// trailing whitespace; the options switch on the remaining passes.
///
/// Detection passes never fail: when removing quoted history or a signature
/// would leave the message empty, the removal is rolled back and the message
/// is returned as-is.
pub fn parse_message(html: &str, options: &ParseMessageOptions) -> Result<ParseResult> {
    let repaired = repair_structure(html);
    let linked;
    let source: &str = if options.autolink {
        linked = autolink(&repaired);
        &linked
    } else {
        &repaired
    };

    // Round-trip through the parser so the rewriter always sees a document
    // with html, head and body elements in place.
    let normalized = Html::parse_document(source).root_element().html();
    let rewritten = rewrite_document(&normalized, options)?;

    let mut document = Html::parse_document(&rewritten);
    collapse_trailing_whitespace(&mut document);
    let complete_html = document.root_element().html();

    let mut result = ParseResult {
        complete_html,
        ..Default::default()
    };

    let quote_candidates = find_quote_candidates(&document);

    if options.clean_signatures {
        // Signatures inside removable quoted history belong to the quoted
        // message, not this one.
        let structural: HashSet<NodeId> = structural_candidates(&document, &quote_candidates)
            .into_iter()
            .collect();
        let removal = signature_removal_set(&document, &structural);
        if removal.is_empty() {
            result.did_find_signature = Some(false);
        } else if survives_removal(&document, &removal) {
            if let Some((sig_html, sig_plain)) = render_signature(&document, removal[0]) {
                result.found_signature_html = Some(sig_html);
                result.found_signature_plain_text = Some(sig_plain);
            }
            debug!(count = removal.len(), "removing signature blocks");
            detach_all(&mut document, &removal);
            result.did_find_signature = Some(true);
        } else {
            warn!("signature removal would empty the message, keeping it");
            result.did_find_signature = Some(false);
        }
    }

    if options.clean_quotations {
        let mut found = false;

        let structural = structural_candidates(&document, &quote_candidates);
        if !structural.is_empty() {
            if survives_removal(&document, &structural) {
                debug!(count = structural.len(), "removing quoted history");
                detach_all(&mut document, &structural);
                found = true;
            } else {
                warn!("quote removal would empty the message, keeping it");
            }
        }

        let header = find_quote_header_nodes(&document);
        if !header.is_empty() {
            if survives_removal(&document, &header) {
                debug!(count = header.len(), "removing trailing reply header");
                detach_all(&mut document, &header);
                found = true;
            } else {
                warn!("reply header removal would empty the message, keeping it");
            }
        }

        result.did_find_quotation = Some(found);
    }

    collapse_trailing_whitespace(&mut document);
    result.parsed_message_html = document.root_element().html();
    Ok(result)
}

/// True when the document still holds content (an image or real text) after
/// the subtrees in `removal` are taken out. Guards every destructive pass.
fn survives_removal(document: &Html, removal: &[NodeId]) -> bool {
    let removal: HashSet<NodeId> = removal.iter().copied().collect();
    let body = match document.select(&BODY_SELECTOR).next() {
        Some(body) => body,
        None => return false,
    };

    let mut stack: Vec<_> = body.children().collect();
    while let Some(node) = stack.pop() {
        if removal.contains(&node.id()) {
            continue;
        }
        match node.value() {
            Node::Element(el) if el.name() == "img" => return true,
            Node::Text(text) if !is_empty_like(text) => return true,
            _ => {}
        }
        stack.extend(node.children());
    }
    false
}

fn detach_all(document: &mut Html, ids: &[NodeId]) {
    for &id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(html: &str) -> String {
        let document = Html::parse_document(html);
        document
            .select(&BODY_SELECTOR)
            .next()
            .map(|body| body.inner_html())
            .unwrap_or_default()
    }

    #[test]
    fn default_options_only_clean() {
        let result = parse_message(
            "<div>Hello<!-- x --><script>a()</script></div><br> ",
            &ParseMessageOptions::default(),
        )
        .unwrap();
        assert_eq!(body_of(&result.complete_html), "<div>Hello</div>");
        assert_eq!(result.complete_html, result.parsed_message_html);
        assert_eq!(result.did_find_quotation, None);
        assert_eq!(result.did_find_signature, None);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let first = parse_message("<div>Hi</div><br>", &ParseMessageOptions::default()).unwrap();
        let second =
            parse_message(&first.complete_html, &ParseMessageOptions::default()).unwrap();
        assert_eq!(first.complete_html, second.complete_html);
    }

    #[test]
    fn removes_trailing_quote_but_keeps_it_in_complete_html() {
        let options = ParseMessageOptions {
            clean_quotations: true,
            ..Default::default()
        };
        let result = parse_message(
            "<div>My reply</div><blockquote>old message</blockquote>",
            &options,
        )
        .unwrap();
        assert!(result.complete_html.contains("blockquote"));
        assert_eq!(body_of(&result.parsed_message_html), "<div>My reply</div>");
        assert_eq!(result.did_find_quotation, Some(true));
    }

    #[test]
    fn keeps_inline_quotes() {
        let options = ParseMessageOptions {
            clean_quotations: true,
            ..Default::default()
        };
        let result = parse_message(
            "<blockquote>you said X</blockquote><div>X is wrong because...</div>",
            &options,
        )
        .unwrap();
        assert!(result.parsed_message_html.contains("you said X"));
        assert_eq!(result.did_find_quotation, Some(false));
    }

    #[test]
    fn removes_translated_reply_header_with_quote() {
        let options = ParseMessageOptions {
            clean_quotations: true,
            ..Default::default()
        };
        let result = parse_message(
            "<div>Salut</div><div>Le 3 janvier 2020, X a écrit :</div>\
             <blockquote>ancien message</blockquote>",
            &options,
        )
        .unwrap();
        assert_eq!(body_of(&result.parsed_message_html), "<div>Salut</div>");
        assert_eq!(result.did_find_quotation, Some(true));
    }

    #[test]
    fn quote_removal_never_empties_the_message() {
        let options = ParseMessageOptions {
            clean_quotations: true,
            ..Default::default()
        };
        let result =
            parse_message("<blockquote>only history</blockquote>", &options).unwrap();
        assert!(result.parsed_message_html.contains("only history"));
        assert_eq!(result.did_find_quotation, Some(false));
    }

    #[test]
    fn extracts_signature_text_and_html() {
        let options = ParseMessageOptions {
            clean_signatures: true,
            ..Default::default()
        };
        let result = parse_message(
            "<div>Hi</div>\
             <div class=\"gmail_signature\"><div>Alice Smith</div><div>VP, Example Corp</div></div>",
            &options,
        )
        .unwrap();
        assert_eq!(result.did_find_signature, Some(true));
        assert_eq!(
            result.found_signature_plain_text.as_deref(),
            Some("Alice Smith\nVP, Example Corp")
        );
        assert!(result.found_signature_html.as_deref().unwrap().contains("Alice Smith"));
        assert_eq!(body_of(&result.parsed_message_html), "<div>Hi</div>");
    }

    #[test]
    fn signature_only_message_is_kept() {
        let options = ParseMessageOptions {
            clean_signatures: true,
            ..Default::default()
        };
        let result = parse_message(
            "<div class=\"gmail_signature\">Alice</div>",
            &options,
        )
        .unwrap();
        assert_eq!(result.did_find_signature, Some(false));
        assert!(result.parsed_message_html.contains("Alice"));
    }

    #[test]
    fn signature_inside_quote_is_not_extracted() {
        let options = ParseMessageOptions {
            clean_signatures: true,
            ..Default::default()
        };
        let result = parse_message(
            "<div>Hi</div>\
             <blockquote><div class=\"gmail_signature\">Bob</div></blockquote>",
            &options,
        )
        .unwrap();
        assert_eq!(result.did_find_signature, Some(false));
    }

    #[test]
    fn autolink_applies_before_parsing() {
        let options = ParseMessageOptions {
            autolink: true,
            ..Default::default()
        };
        let result = parse_message("<div>see https://example.com/x</div>", &options).unwrap();
        assert!(result
            .complete_html
            .contains("<a href=\"https://example.com/x\""));
    }

    #[test]
    fn remote_blocking_and_viewport_compose() {
        let options = ParseMessageOptions {
            no_remote_content: true,
            force_viewport: Some("width=device-width".to_string()),
            ..Default::default()
        };
        let result =
            parse_message("<div>Hi<img src=\"https://example.com/a.png\"></div>", &options)
                .unwrap();
        assert!(!result.complete_html.contains("https://example.com/a.png"));
        // Re-serialization through html5ever reorders attributes, so assert
        // on the attributes rather than the exact tag text.
        assert!(result.complete_html.contains("name=\"viewport\""));
        assert!(result.complete_html.contains("content=\"width=device-width\""));
    }

    #[test]
    fn full_option_cleaning_is_idempotent() {
        let options = ParseMessageOptions {
            autolink: true,
            enhance_links: true,
            no_remote_content: true,
            force_viewport: Some("width=device-width".to_string()),
            include_style: Some("body{margin:0}".to_string()),
            clean_styles: true,
            ..Default::default()
        };
        let first = parse_message(
            "<div style=\"position: fixed; color: red\">see www.example.com</div>\
             <img src=\"https://example.com/a.png\">",
            &options,
        )
        .unwrap();
        let second = parse_message(&first.complete_html, &options).unwrap();
        assert_eq!(first.complete_html, second.complete_html);
        assert_eq!(second.complete_html.matches("body{margin:0}").count(), 1);
        assert_eq!(second.complete_html.matches("name=\"viewport\"").count(), 1);
        assert!(!second.complete_html.contains("(https://www.example.com)"));
    }

    #[test]
    fn fragment_without_body_gets_one() {
        let result = parse_message("just text", &ParseMessageOptions::default()).unwrap();
        assert!(result.complete_html.starts_with("<html>"));
        assert!(result.complete_html.contains("<body>just text</body>"));
    }
}

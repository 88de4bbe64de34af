use std::borrow::Cow;

/// Repairs the fragment shape some forwarded-message generators emit: a
/// `<head>` open tag before any `<html>` tag. Everything before the `<head>`
/// is junk; the remainder is wrapped in a synthetic `<html>` element.
/// Anything else passes through unchanged.
pub fn repair_structure(html: &str) -> Cow<'_, str> {
    let head = match find_open_tag(html, "head") {
        Some(pos) => pos,
        None => return Cow::Borrowed(html),
    };

    // A proper <html> root, or a <blockquote> ahead of the head, means the
    // document is not the malformation we are looking for.
    if let Some(html_pos) = find_open_tag(html, "html")
        && html_pos < head
    {
        return Cow::Borrowed(html);
    }
    if let Some(bq_pos) = find_open_tag(html, "blockquote")
        && bq_pos < head
    {
        return Cow::Borrowed(html);
    }

    Cow::Owned(format!("<html>{}</html>", &html[head..]))
}

/// Byte offset of the first `<name` open tag, matched case-insensitively and
/// only when followed by a tag-name boundary (so `<head` does not match
/// `<header`).
fn find_open_tag(html: &str, name: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{name}");
    let mut search_from = 0;
    while let Some(rel) = lower[search_from..].find(&needle) {
        let pos = search_from + rel;
        let after = pos + needle.len();
        match lower.as_bytes().get(after) {
            None | Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')
            | Some(b'/') => return Some(pos),
            _ => search_from = after,
        }
    }
    None
}

use crate::constants::{
    AUTOLINK_EMAIL_RE, AUTOLINK_PHONE_RE, AUTOLINK_URL_RE, SKIPPED_AUTOLINK_HOSTS,
};

/// Tags whose text content must never be linkified: existing anchors, and
/// places where injected markup would be rendered literally or executed.
const SUPPRESSED_TAGS: &[&str] = &["a", "head", "style", "script", "textarea"];

#[derive(Clone, Copy, PartialEq)]
enum LinkKind {
    Url,
    Email,
    Phone,
}

/// Wraps bare URLs, email addresses and phone numbers in serialized HTML with
/// anchor tags. Markup passes through untouched; only text runs outside the
/// suppressed tags are scanned. Operates on the serialized form because the
/// matches can span entity boundaries the parser has already resolved.
pub fn autolink(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut suppressed: u32 = 0;

    while let Some(lt) = rest.find('<') {
        let (text, tail) = rest.split_at(lt);
        if suppressed == 0 {
            linkify_text(text, &mut out);
        } else {
            out.push_str(text);
        }

        if tail.starts_with("<!--") {
            let end = tail.find("-->").map(|p| p + 3).unwrap_or(tail.len());
            out.push_str(&tail[..end]);
            rest = &tail[end..];
            continue;
        }

        let end = tail.find('>').map(|p| p + 1).unwrap_or(tail.len());
        let tag = &tail[..end];
        track_suppression(tag, &mut suppressed);
        out.push_str(tag);
        rest = &tail[end..];
    }

    if suppressed == 0 {
        linkify_text(rest, &mut out);
    } else {
        out.push_str(rest);
    }
    out
}

fn track_suppression(tag: &str, suppressed: &mut u32) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();
    if !SUPPRESSED_TAGS.contains(&name.as_str()) {
        return;
    }
    if closing {
        *suppressed = suppressed.saturating_sub(1);
    } else if !tag.ends_with("/>") {
        *suppressed += 1;
    }
}

fn linkify_text(text: &str, out: &mut String) {
    if text.is_empty() {
        out.push_str(text);
        return;
    }

    let mut matches: Vec<(usize, usize, LinkKind)> = Vec::new();
    for (re, kind) in [
        (&*AUTOLINK_URL_RE, LinkKind::Url),
        (&*AUTOLINK_EMAIL_RE, LinkKind::Email),
        (&*AUTOLINK_PHONE_RE, LinkKind::Phone),
    ] {
        for m in re.find_iter(text) {
            matches.push((m.start(), m.end(), kind));
        }
    }
    matches.sort_by_key(|&(start, end, _)| (start, std::cmp::Reverse(end)));

    let mut cursor = 0;
    for (start, end, kind) in matches {
        if start < cursor {
            continue;
        }
        let matched = &text[start..end];
        if start > 0 && text.as_bytes()[start - 1] == b'/' {
            // Tail of a longer URL the pattern only partially covered.
            continue;
        }
        if kind == LinkKind::Url
            && SKIPPED_AUTOLINK_HOSTS.iter().any(|host| matched.contains(host))
        {
            continue;
        }

        out.push_str(&text[cursor..start]);
        let href = match kind {
            LinkKind::Url => {
                if matched[..4.min(matched.len())].eq_ignore_ascii_case("www.") {
                    format!("https://{matched}")
                } else {
                    matched.to_string()
                }
            }
            LinkKind::Email => format!("mailto:{matched}"),
            LinkKind::Phone => {
                let digits: String = matched
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '+')
                    .collect();
                format!("tel:{digits}")
            }
        };
        out.push_str("<a href=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(&href));
        out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
        out.push_str(matched);
        out.push_str("</a>");
        cursor = end;
    }
    out.push_str(&text[cursor..]);
}

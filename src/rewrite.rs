use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, doc_comments, element, text};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::constants::{
    CSS_IMPORT_RE, CSS_URL_RE, DEFAULT_CLEANED_STYLE_PROPERTIES, DOMAIN_EXACT_RE, EMAIL_EXACT_RE,
    IMAGE_URL_ATTRIBUTES, REMOTE_URL_ATTRIBUTES, TRACKER_HOSTS, is_local_url,
};
use crate::error::Result;
use crate::options::ParseMessageOptions;

// <meta content="0; url=..."> style numeric redirects.
static META_REDIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\d+\s*;\s*url\s*=").unwrap());

static STYLE_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</style").unwrap());

/// Single streaming pass over the serialized document. Always-on hygiene
/// (comments, scripts, tracking pixels, meta redirects) plus the opt-in
/// rewrites: link enhancement, remote-content blocking, viewport forcing,
/// style injection and inline-style cleaning.
pub fn rewrite_document(html: &str, options: &ParseMessageOptions) -> Result<String> {
    let mut handlers = vec![
        element!("script", |el| {
            el.remove();
            Ok(())
        }),
        // Tracking pixels: known open-tracker hosts, or 0/1-pixel images.
        element!("img", |el| {
            let src = el.get_attribute("src").unwrap_or_default();
            let tracker = TRACKER_HOSTS.iter().any(|host| src.contains(host));
            let pixel = ["width", "height"].iter().any(|attr| {
                el.get_attribute(attr)
                    .is_some_and(|v| matches!(v.trim(), "0" | "1"))
            });
            if tracker || pixel {
                el.remove();
            }
            Ok(())
        }),
        element!("meta", |el| {
            let refresh = el
                .get_attribute("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
            let redirect = el
                .get_attribute("content")
                .is_some_and(|v| META_REDIRECT_RE.is_match(&v));
            if refresh || redirect {
                el.remove();
            }
            Ok(())
        }),
    ];

    if options.enhance_links {
        handlers.push(element!("a[href]", |el| {
            let href = el.get_attribute("href").unwrap_or_default();
            let mut target = href.clone();
            if Url::parse(&href).is_err() {
                if EMAIL_EXACT_RE.is_match(&href) {
                    target = format!("mailto:{href}");
                } else if DOMAIN_EXACT_RE.is_match(&href) {
                    target = format!("https://{href}");
                }
                if target != href {
                    el.set_attribute("href", &target)?;
                }
            }
            // Surface the real destination on hover. A title that already
            // carries the destination is left alone so repeated cleaning does
            // not stack "(url)" suffixes.
            match el.get_attribute("title") {
                Some(existing) if existing.contains(&target) => {}
                Some(existing) if !existing.trim().is_empty() => {
                    el.set_attribute("title", &format!("{existing} ({target})"))?;
                }
                _ => el.set_attribute("title", &target)?,
            }
            Ok(())
        }));
    }

    if options.no_remote_content {
        let image_placeholder = options.remote_content_replacements.image_placeholder().to_string();
        let other_placeholder = options.remote_content_replacements.other_placeholder().to_string();

        for (tag, attrs) in REMOTE_URL_ATTRIBUTES {
            let image_placeholder = image_placeholder.clone();
            let other_placeholder = other_placeholder.clone();
            handlers.push(element!(*tag, move |el| {
                for attr in *attrs {
                    let value = match el.get_attribute(attr) {
                        Some(value) => value,
                        None => continue,
                    };
                    let replacement = if IMAGE_URL_ATTRIBUTES.contains(attr) {
                        &image_placeholder
                    } else {
                        &other_placeholder
                    };
                    if *attr == "srcset" {
                        let blocked = block_srcset(&value, replacement);
                        if blocked != value {
                            el.set_attribute(attr, &blocked)?;
                        }
                    } else if !is_local_url(&value) {
                        el.set_attribute(attr, replacement)?;
                    }
                }
                Ok(())
            }));
        }

        // Inline style attributes can fetch via url() and @import too.
        // CSS urls are almost always images, so they take the image placeholder.
        let placeholder = image_placeholder.clone();
        handlers.push(element!("[style]", move |el| {
            if let Some(style) = el.get_attribute("style") {
                let scrubbed = scrub_css(&style, &placeholder);
                if scrubbed != style {
                    el.set_attribute("style", &scrubbed)?;
                }
            }
            Ok(())
        }));

        // <style> text arrives in chunks; buffer until the last one.
        let placeholder = image_placeholder.clone();
        let mut css_buffer = String::new();
        handlers.push(text!("style", move |chunk| {
            css_buffer.push_str(chunk.as_str());
            if chunk.last_in_text_node() {
                let scrubbed = scrub_css(&css_buffer, &placeholder);
                chunk.replace(&scrubbed, ContentType::Html);
                css_buffer.clear();
            } else {
                chunk.remove();
            }
            Ok(())
        }));
    }

    if let Some(viewport) = &options.force_viewport {
        handlers.push(element!(r#"meta[name="viewport"]"#, |el| {
            el.remove();
            Ok(())
        }));
        let meta = format!(
            r#"<meta name="viewport" content="{}">"#,
            html_escape::encode_double_quoted_attribute(viewport)
        );
        handlers.push(element!("head", move |el| {
            el.append(&meta, ContentType::Html);
            Ok(())
        }));
    }

    if let Some(css) = &options.include_style {
        // Drop any previously injected copy so repeated cleaning keeps exactly
        // one, the same way the viewport pass replaces existing metas.
        handlers.push(element!("style[data-mailtools-style]", |el| {
            el.remove();
            Ok(())
        }));
        // A stylesheet containing "</style" would escape the element.
        let css = STYLE_CLOSE_RE.replace_all(css, "");
        let style = format!("<style data-mailtools-style>{css}</style>");
        handlers.push(element!("head", move |el| {
            el.append(&style, ContentType::Html);
            Ok(())
        }));
    }

    if options.clean_styles {
        let cleaned: Vec<String> = match &options.cleaned_style_properties {
            Some(list) => list.iter().map(|p| p.trim().to_ascii_lowercase()).collect(),
            None => DEFAULT_CLEANED_STYLE_PROPERTIES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        };
        handlers.push(element!("[style]", move |el| {
            let style = match el.get_attribute("style") {
                Some(style) => style,
                None => return Ok(()),
            };
            let kept: Vec<&str> = split_declarations(&style)
                .into_iter()
                .map(str::trim)
                .filter(|decl| !decl.is_empty())
                .filter(|decl| {
                    let property = decl
                        .split(':')
                        .next()
                        .unwrap_or("")
                        .trim()
                        .to_ascii_lowercase();
                    !cleaned.contains(&property)
                })
                .collect();
            if kept.is_empty() {
                el.remove_attribute("style");
            } else {
                el.set_attribute("style", &kept.join("; "))?;
            }
            Ok(())
        }));
    }

    let mut output = Vec::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            document_content_handlers: vec![doc_comments!(|comment| {
                comment.remove();
                Ok(())
            })],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );
    rewriter.write(html.as_bytes())?;
    rewriter.end()?;
    Ok(String::from_utf8(output)?)
}

/// Splits an inline style on declaration boundaries only: semicolons inside
/// quotes or parentheses (data: URIs in `url(...)`, mostly) do not separate
/// declarations.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: u32 = 0;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}

/// Replaces each remote URL in a srcset while keeping the width/density
/// descriptors, so responsive image layout survives the blocking.
fn block_srcset(srcset: &str, replacement: &str) -> String {
    srcset
        .split(',')
        .map(|part| {
            let part = part.trim();
            let mut pieces = part.split_whitespace();
            let url = pieces.next().unwrap_or("");
            let descriptor = pieces.collect::<Vec<_>>().join(" ");
            let url = if is_local_url(url) { url } else { replacement };
            if descriptor.is_empty() {
                url.to_string()
            } else {
                format!("{url} {descriptor}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn scrub_css(css: &str, placeholder: &str) -> String {
    let pass = CSS_URL_RE.replace_all(css, |caps: &regex::Captures| {
        let url = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if is_local_url(url) {
            caps[0].to_string()
        } else if caps.get(1).is_some() {
            format!("url('{placeholder}')")
        } else if caps.get(2).is_some() {
            format!("url(\"{placeholder}\")")
        } else {
            format!("url({placeholder})")
        }
    });
    CSS_IMPORT_RE
        .replace_all(&pass, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                format!("@import '{placeholder}'")
            } else {
                format!("@import \"{placeholder}\"")
            }
        })
        .into_owned()
}

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Selector;

// Using lazy_static to compile regexes and selectors only once for performance.
lazy_static! {
    // --- Regexes ---

    // End of a reply header line: "... wrote:" / "... sent:" and the common
    // translations mail clients localize the header into. Anchored at line end,
    // the colon is optional because some clients drop it. German and
    // Scandinavian clients put the sender after the verb ("Am ... schrieb X:",
    // "Den ... skrev X"), so those verbs get a separate verb-medial alternative.
    pub static ref QUOTE_HEADER_END_RE: Regex = Regex::new(
        r"(?i)((wrote|sent|a écrit|napisał|napisała|geschreven|escreveu|escribió)\s*:?\s*$|(schrieb|schreef|skrev)\b[^:\n]*:?\s*$)"
    ).unwrap();

    // Start of a reply header line: "On ...", "Le ...", "Am ...", etc.
    pub static ref QUOTE_HEADER_START_RE: Regex = Regex::new(
        r"(?i)^\s*(on|le|w dniu|op|am|den|på|em|el)\b"
    ).unwrap();

    /// Splitter patterns for plaintext bodies. Everything from the first match
    /// on is quoted history.
    ///
    /// Flags used:
    ///   - `i`: Case-insensitive matching.
    ///   - `x`: Extended mode, allows whitespace and comments for readability.
    ///   - `m`: Multiline mode, `^` and `$` match start/end of lines.
    pub static ref PLAINTEXT_SPLITTER_RE: Regex = Regex::new(
        r#"(?ixm)
        ( # "On Date, Name wrote:" and translated equivalents
            ^>?>?\s*(on|le|w\ dniu|op|am|den|på|em|el)\s+.*
            (
                (wrote|sent|a\ écrit|napisał|napisała|geschreven|escreveu|escribió)\s*:?\s*$
                | # verb-medial languages: sender follows the verb
                (schrieb|schreef|skrev)\b[^:\n]*:?\s*$
            )
        )
        | # OR dashed lines like ---original message---
        (
            ^--+\s*original\s+message\s*--+
        )
        | # OR forwarded headers like > From: or From:
        (
            ^>?>?\s*From:
        )
        "#
    ).unwrap();

    // --- Autolink matchers ---

    pub static ref AUTOLINK_URL_RE: Regex = Regex::new(
        r#"(?i)\b(?:https?://|www\.)[^\s<>"'()]+[^\s<>"'().,;:!?]"#
    ).unwrap();

    pub static ref AUTOLINK_EMAIL_RE: Regex = Regex::new(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
    ).unwrap();

    pub static ref AUTOLINK_PHONE_RE: Regex = Regex::new(
        r"(?:\+\d{1,3}\s?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b"
    ).unwrap();

    // Exact-match variants used by link enhancement on existing hrefs.
    pub static ref EMAIL_EXACT_RE: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$"
    ).unwrap();

    pub static ref DOMAIN_EXACT_RE: Regex = Regex::new(
        r"^[A-Za-z0-9][A-Za-z0-9.-]*\.[A-Za-z]{2,}(?:[/?#]\S*)?$"
    ).unwrap();

    // --- CSS url scanning ---

    // url(...) with single, double, or no quotes. The regex crate has no
    // backreferences, so the three quoting styles are separate alternatives.
    pub static ref CSS_URL_RE: Regex = Regex::new(
        r#"(?i)url\(\s*(?:'([^']*)'|"([^"]*)"|([^'")][^)]*))\s*\)"#
    ).unwrap();

    // @import with a bare string (the url(...) form is caught by CSS_URL_RE).
    pub static ref CSS_IMPORT_RE: Regex = Regex::new(
        r#"(?i)@import\s+(?:'([^']*)'|"([^"]*)")"#
    ).unwrap();

    // --- Selectors ---

    pub static ref BODY_SELECTOR: Selector = Selector::parse("body").unwrap();
}

/// Attribute substring that marks an element as a quote container
/// (covers `gmail_quote` and the generic "quote" class/id convention).
pub const QUOTE_ATTRIBUTE_KEYWORD: &str = "quote";

/// Attribute substring that marks an element as a signature block
/// (covers `gmail_signature` and the generic convention).
pub const SIGNATURE_ATTRIBUTE_KEYWORD: &str = "signature";

/// Tags that participate in text flow; trailing-whitespace collapse may
/// recurse through and delete these. Anything else (img, table, ...) halts it.
pub const TEXTUAL_TAGS: &[&str] = &[
    "div", "p", "span", "b", "a", "em", "i", "s", "strong", "hr", "br", "body", "html",
];

/// Tag -> URL-bearing attributes that a user agent fetches automatically.
/// `a[href]` is deliberately absent: following a link is a user action.
pub const REMOTE_URL_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("img", &["src", "srcset"]),
    ("iframe", &["src"]),
    ("frame", &["src"]),
    ("embed", &["src"]),
    ("video", &["src", "poster"]),
    ("audio", &["src"]),
    ("source", &["src", "srcset"]),
    ("track", &["src"]),
    ("input", &["src"]),
    ("link", &["href"]),
    ("object", &["data"]),
    ("form", &["action"]),
    ("script", &["src"]),
    ("body", &["background"]),
    ("table", &["background"]),
    ("td", &["background"]),
];

/// Attributes whose replacement should still render as an image.
pub const IMAGE_URL_ATTRIBUTES: &[&str] =
    &["src", "srcset", "background", "poster", "icon", "placeholder"];

/// Known open-tracking hosts. Images pointing at these are dropped outright.
pub const TRACKER_HOSTS: &[&str] = &[
    "mailstat.us",
    "mailtrack.io",
    "t.yesware.com",
    "mailfoogae.appspot.com",
    "t.signauxdeux.com",
    "bl-1.com",
    "mandrillapp.com/track",
    "list-manage.com/track",
    "google-analytics.com",
];

/// Asset hosts that show up as bare URLs in message text but are never
/// content the user wants linkified (inline emoji images, mostly).
pub const SKIPPED_AUTOLINK_HOSTS: &[&str] = &["twemoji.maxcdn.com"];

/// Inline style properties removed by the clean-styles pass unless the caller
/// supplies its own list. These are the ones that let a message fight the
/// client's own layout.
pub const DEFAULT_CLEANED_STYLE_PROPERTIES: &[&str] =
    &["position", "z-index", "font-family", "min-width", "min-height"];

/// 1x100 transparent GIF used as the default replacement for blocked images.
pub const TRANSPARENT_PIXEL: &str =
    "data:image/gif;base64,R0lGODlhAQBkAIAAAAAAAP///yH5BAEAAAAALAAAAAABAGQAAAIDRHQFADs=";

/// Default replacement for blocked non-image URLs.
pub const GENERIC_URL_PLACEHOLDER: &str = "#";

/// Returns true for URLs that do not trigger a network fetch.
pub fn is_local_url(url: &str) -> bool {
    let prefix: String = url.trim().chars().take(5).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("data:") || prefix.starts_with("cid:")
}

/// Whitespace-only, or a bare dash remnant left behind by a stripped
/// signature separator.
pub fn is_empty_like(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.chars().all(|c| c == '-' || c == '–' || c == '—')
}
